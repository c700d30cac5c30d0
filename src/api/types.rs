//! Request bodies for the control API

use serde::Deserialize;

use crate::domain::PiggyKind;

/// Body for task completions and penalties
#[derive(Debug, Clone, Deserialize)]
pub struct PointsRequest {
    pub points: i64,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RewardRequest {
    pub reward_id: String,
    pub cost: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolveRequest {
    pub answer: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PiggyRequest {
    #[serde(rename = "type")]
    pub kind: PiggyKind,
    pub amount: i64,
    pub parent_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShopRequest {
    pub item: String,
    pub price: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyCodeRequest {
    pub code: String,
}
