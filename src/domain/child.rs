use serde::{Deserialize, Serialize};

/// Child identifier (opaque, assigned by the onboarding flow)
pub type ChildId = String;

/// A child account with its point balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Child {
    pub id: ChildId,
    /// Owning guardian account; also the parental gate subject
    pub guardian_id: String,
    pub name: String,
    pub age: Option<u32>,
    /// Balance at onboarding, the base of the conservation check
    pub initial_balance: i64,
    pub balance: i64,
    pub created_at: i64,
}

/// Onboarding request for a new child
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChild {
    /// Explicit id; a uuid is generated when absent
    #[serde(default)]
    pub id: Option<ChildId>,
    pub guardian_id: String,
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub initial_balance: i64,
}

impl NewChild {
    pub fn new(guardian_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            guardian_id: guardian_id.into(),
            name: name.into(),
            age: None,
            initial_balance: 0,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_balance(mut self, balance: i64) -> Self {
        self.initial_balance = balance;
        self
    }
}
