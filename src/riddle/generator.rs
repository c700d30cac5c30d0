//! Generator trait and response validation

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Riddle difficulty requested from a generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }

    /// Pick a difficulty from the child's age
    pub fn for_age(age: Option<u32>, fallback: Difficulty) -> Self {
        match age {
            Some(0..=7) => Self::Easy,
            Some(8..=11) => Self::Medium,
            Some(_) => Self::Hard,
            None => fallback,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Raw generator output, untrusted until [`GeneratedRiddle::validate`] passes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedRiddle {
    pub question: String,
    pub answer: String,
    pub hint: String,
    pub points: i64,
}

impl GeneratedRiddle {
    /// Trim fields and check the schema. Returns the cleaned riddle.
    pub fn validate(self, max_points: i64) -> Result<Self, String> {
        let cleaned = Self {
            question: self.question.trim().to_string(),
            answer: self.answer.trim().to_string(),
            hint: self.hint.trim().to_string(),
            points: self.points,
        };

        for (field, value) in [
            ("question", &cleaned.question),
            ("answer", &cleaned.answer),
            ("hint", &cleaned.hint),
        ] {
            if value.is_empty() {
                return Err(format!("empty {field}"));
            }
        }
        if !(1..=max_points).contains(&cleaned.points) {
            return Err(format!(
                "points {} outside 1..={max_points}",
                cleaned.points
            ));
        }
        if cleaned.hint.eq_ignore_ascii_case(&cleaned.answer) {
            return Err("hint gives away the answer".to_string());
        }
        Ok(cleaned)
    }
}

/// External source of daily riddles (possibly slow or unreliable)
#[async_trait]
pub trait RiddleGenerator: Send + Sync {
    /// Produce one riddle of the requested difficulty
    async fn generate(&self, difficulty: Difficulty) -> Result<GeneratedRiddle>;

    /// Identifier for logs
    fn id(&self) -> &str;
}

/// Decode a generator payload.
///
/// Accepts the riddle object directly, or a `text`/`content` string field
/// that carries the JSON object inside free text.
pub fn parse_payload(value: serde_json::Value) -> Result<GeneratedRiddle> {
    if value.get("question").is_some() {
        return serde_json::from_value(value).context("Malformed riddle object");
    }

    let text = ["text", "content"]
        .iter()
        .find_map(|key| value.get(*key).and_then(|v| v.as_str()));
    let Some(text) = text else {
        bail!("Response has neither a riddle object nor a text field");
    };

    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        bail!("No JSON object in generator text");
    };
    if end < start {
        bail!("No JSON object in generator text");
    }
    serde_json::from_str(&text[start..=end]).context("Malformed riddle object in text")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn riddle(points: i64) -> GeneratedRiddle {
        GeneratedRiddle {
            question: "  What has keys but can't open locks? ".to_string(),
            answer: "A piano".to_string(),
            hint: "Music".to_string(),
            points,
        }
    }

    #[test]
    fn test_validate_trims_and_bounds() {
        let ok = riddle(10).validate(50).unwrap();
        assert_eq!(ok.question, "What has keys but can't open locks?");

        assert!(riddle(0).validate(50).is_err());
        assert!(riddle(51).validate(50).is_err());

        let mut empty = riddle(10);
        empty.hint = "   ".to_string();
        assert_eq!(empty.validate(50).unwrap_err(), "empty hint");
    }

    #[test]
    fn test_hint_must_not_equal_answer() {
        let mut leaky = riddle(10);
        leaky.hint = "a piano".to_string();
        assert!(leaky.validate(50).is_err());
    }

    #[test]
    fn test_parse_direct_object() {
        let parsed = parse_payload(json!({
            "question": "Q", "answer": "A", "hint": "H", "points": 5
        }))
        .unwrap();
        assert_eq!(parsed.points, 5);
    }

    #[test]
    fn test_parse_embedded_text() {
        let parsed = parse_payload(json!({
            "text": "Here you go!\n{\"question\":\"Q\",\"answer\":\"A\",\"hint\":\"H\",\"points\":3}\nEnjoy"
        }))
        .unwrap();
        assert_eq!(parsed.answer, "A");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_payload(json!({ "question": "Q" })).is_err());
        assert!(parse_payload(json!({ "text": "no json here" })).is_err());
        assert!(parse_payload(json!({ "riddle": 1 })).is_err());
        assert!(parse_payload(json!({ "question": "Q", "answer": "A", "hint": "H", "points": "many" })).is_err());
    }

    #[test]
    fn test_difficulty_for_age() {
        assert_eq!(Difficulty::for_age(Some(6), Difficulty::Hard), Difficulty::Easy);
        assert_eq!(Difficulty::for_age(Some(10), Difficulty::Easy), Difficulty::Medium);
        assert_eq!(Difficulty::for_age(Some(13), Difficulty::Easy), Difficulty::Hard);
        assert_eq!(Difficulty::for_age(None, Difficulty::Hard), Difficulty::Hard);
    }
}
