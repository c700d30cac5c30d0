//! Built-in offline riddle bank

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use super::generator::{Difficulty, GeneratedRiddle, RiddleGenerator};

struct BankEntry {
    difficulty: Difficulty,
    question: &'static str,
    answer: &'static str,
    hint: &'static str,
    points: i64,
}

const BANK: &[BankEntry] = &[
    BankEntry {
        difficulty: Difficulty::Easy,
        question: "What has to be broken before you can use it?",
        answer: "egg",
        hint: "You might eat it for breakfast.",
        points: 5,
    },
    BankEntry {
        difficulty: Difficulty::Easy,
        question: "What has hands but cannot clap?",
        answer: "clock",
        hint: "It hangs on the wall and ticks.",
        points: 5,
    },
    BankEntry {
        difficulty: Difficulty::Easy,
        question: "What gets wetter the more it dries?",
        answer: "towel",
        hint: "You use it after a bath.",
        points: 5,
    },
    BankEntry {
        difficulty: Difficulty::Easy,
        question: "What has one eye but cannot see?",
        answer: "needle",
        hint: "It helps you sew.",
        points: 5,
    },
    BankEntry {
        difficulty: Difficulty::Medium,
        question: "What can travel around the world while staying in a corner?",
        answer: "stamp",
        hint: "Look at the top of an envelope.",
        points: 10,
    },
    BankEntry {
        difficulty: Difficulty::Medium,
        question: "What has keys but can't open locks?",
        answer: "piano",
        hint: "It makes music.",
        points: 10,
    },
    BankEntry {
        difficulty: Difficulty::Medium,
        question: "The more of this there is, the less you see. What is it?",
        answer: "darkness",
        hint: "Turn off the lights.",
        points: 10,
    },
    BankEntry {
        difficulty: Difficulty::Medium,
        question: "What has a neck but no head?",
        answer: "bottle",
        hint: "You can pour water out of it.",
        points: 10,
    },
    BankEntry {
        difficulty: Difficulty::Hard,
        question: "I speak without a mouth and hear without ears. I have no body, but I come alive with wind. What am I?",
        answer: "echo",
        hint: "Shout in a canyon.",
        points: 20,
    },
    BankEntry {
        difficulty: Difficulty::Hard,
        question: "What comes once in a minute, twice in a moment, but never in a thousand years?",
        answer: "m",
        hint: "Look at the spelling.",
        points: 20,
    },
    BankEntry {
        difficulty: Difficulty::Hard,
        question: "I have cities but no houses, forests but no trees, and water but no fish. What am I?",
        answer: "map",
        hint: "Explorers carry one.",
        points: 20,
    },
    BankEntry {
        difficulty: Difficulty::Hard,
        question: "What can you keep after giving it to someone?",
        answer: "your word",
        hint: "It's a promise.",
        points: 20,
    },
];

/// Rotates through a fixed list of riddles per difficulty
#[derive(Default)]
pub struct RiddleBank {
    cursor: AtomicUsize,
}

impl RiddleBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the rotation at a given offset (e.g. derived from the date)
    pub fn starting_at(offset: usize) -> Self {
        Self {
            cursor: AtomicUsize::new(offset),
        }
    }
}

#[async_trait]
impl RiddleGenerator for RiddleBank {
    async fn generate(&self, difficulty: Difficulty) -> Result<GeneratedRiddle> {
        let matching: Vec<&BankEntry> = BANK
            .iter()
            .filter(|e| e.difficulty == difficulty)
            .collect();
        if matching.is_empty() {
            return Err(anyhow!("No riddles for difficulty {difficulty}"));
        }

        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % matching.len();
        let entry = matching[index];
        Ok(GeneratedRiddle {
            question: entry.question.to_string(),
            answer: entry.answer.to_string(),
            hint: entry.hint.to_string(),
            points: entry.points,
        })
    }

    fn id(&self) -> &str {
        "bank"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bank_rotates_within_difficulty() {
        let bank = RiddleBank::new();
        let first = bank.generate(Difficulty::Easy).await.unwrap();
        let second = bank.generate(Difficulty::Easy).await.unwrap();
        assert_ne!(first.question, second.question);
    }

    #[tokio::test]
    async fn test_bank_entries_pass_validation() {
        let bank = RiddleBank::new();
        for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            for _ in 0..4 {
                let riddle = bank.generate(difficulty).await.unwrap();
                assert!(riddle.validate(50).is_ok());
            }
        }
    }
}
