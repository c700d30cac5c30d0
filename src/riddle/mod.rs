//! Daily riddles: one per child per calendar day
//!
//! Content comes from a [`RiddleGenerator`]. Creation is idempotent: callers
//! racing on the same (child, day) all receive the row that won the insert.

mod bank;
mod generator;
mod http;

pub use bank::RiddleBank;
pub use generator::{Difficulty, GeneratedRiddle, RiddleGenerator, parse_payload};
pub use http::HttpRiddleGenerator;

use std::sync::Arc;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::clock::{Clock, format_day};
use crate::config::{GeneratorKind, GeneratorSettings};
use crate::db::EconomyDb;
use crate::error::{EconomyError, EconomyResult};

const RIDDLE_COLUMNS: &str =
    "id, child_id, day, question, answer, hint, points, difficulty, solved, solved_at, created_at";

/// Persisted riddle for one child and day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyArtifact {
    pub id: String,
    pub child_id: String,
    pub day: String,
    pub question: String,
    pub answer: String,
    pub hint: String,
    pub points: i64,
    pub difficulty: Difficulty,
    pub solved: bool,
    pub solved_at: Option<i64>,
    pub created_at: i64,
}

/// What a child is allowed to see before solving
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiddleView {
    pub id: String,
    pub day: String,
    pub question: String,
    pub points: i64,
    pub difficulty: Difficulty,
    pub solved: bool,
}

impl DailyArtifact {
    pub fn view(&self) -> RiddleView {
        RiddleView {
            id: self.id.clone(),
            day: self.day.clone(),
            question: self.question.clone(),
            points: self.points,
            difficulty: self.difficulty,
            solved: self.solved,
        }
    }

    /// Case- and whitespace-insensitive answer check
    pub fn matches_answer(&self, answer: &str) -> bool {
        normalize_answer(answer) == normalize_answer(&self.answer)
    }
}

fn normalize_answer(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Build the generator selected in config
pub fn generator_from_settings(settings: &GeneratorSettings) -> Arc<dyn RiddleGenerator> {
    match settings.kind {
        GeneratorKind::Http if !settings.endpoint.is_empty() => Arc::new(
            HttpRiddleGenerator::new(settings.endpoint.clone(), settings.timeout()),
        ),
        GeneratorKind::Http => {
            warn!("[kidbank:riddle] HTTP generator selected without an endpoint, using the riddle bank");
            Arc::new(RiddleBank::new())
        }
        GeneratorKind::Bank => Arc::new(RiddleBank::new()),
    }
}

/// Produces and stores the daily riddle
#[derive(Clone)]
pub struct DailyRiddles {
    db: EconomyDb,
    clock: Arc<dyn Clock>,
    generator: Arc<dyn RiddleGenerator>,
    settings: GeneratorSettings,
}

impl DailyRiddles {
    pub fn new(
        db: EconomyDb,
        clock: Arc<dyn Clock>,
        generator: Arc<dyn RiddleGenerator>,
        settings: GeneratorSettings,
    ) -> Self {
        Self {
            db,
            clock,
            generator,
            settings,
        }
    }

    /// Today's riddle for `child_id`, generating it on first request
    pub async fn today(&self, child_id: &str) -> EconomyResult<DailyArtifact> {
        self.get_or_create(child_id, self.clock.today()).await
    }

    /// Stored riddle for (child, day), if any
    pub fn get(&self, child_id: &str, day: NaiveDate) -> EconomyResult<Option<DailyArtifact>> {
        let conn = self.db.conn();
        load_in(&conn, child_id, &format_day(day))
    }

    /// Return the riddle for (child, day), creating it if absent.
    ///
    /// The generator runs outside any lock and is bounded by the configured
    /// timeout. A failed, slow, or malformed generation persists nothing.
    pub async fn get_or_create(
        &self,
        child_id: &str,
        day: NaiveDate,
    ) -> EconomyResult<DailyArtifact> {
        let day_str = format_day(day);

        let age = {
            let conn = self.db.conn();
            if let Some(existing) = load_in(&conn, child_id, &day_str)? {
                return Ok(existing);
            }
            child_age(&conn, child_id)?
        };

        let difficulty = Difficulty::for_age(age, self.settings.default_difficulty);
        debug!(
            "[kidbank:riddle] Generating {} riddle for {} on {} via {}",
            difficulty,
            child_id,
            day_str,
            self.generator.id()
        );

        let timeout = self.settings.timeout();
        let generated =
            match tokio::time::timeout(timeout, self.generator.generate(difficulty)).await {
                Err(_) => {
                    warn!("[kidbank:riddle] Generator timed out after {:?}", timeout);
                    return Err(EconomyError::GenerationFailed(format!(
                        "timed out after {}s",
                        timeout.as_secs()
                    )));
                }
                Ok(Err(e)) => {
                    warn!("[kidbank:riddle] Generator failed: {:#}", e);
                    return Err(EconomyError::GenerationFailed(format!("{e:#}")));
                }
                Ok(Ok(riddle)) => riddle,
            };

        let riddle = generated
            .validate(self.settings.max_points)
            .map_err(|reason| {
                warn!("[kidbank:riddle] Rejected generator output: {}", reason);
                EconomyError::GenerationFailed(reason)
            })?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = self.clock.now_ms();

        let stored = self.db.write_tx(|tx| {
            let inserted = tx.execute(
                r#"INSERT INTO daily_riddles
                   (id, child_id, day, question, answer, hint, points, difficulty, solved, created_at)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9)
                   ON CONFLICT(child_id, day) DO NOTHING"#,
                params![
                    id,
                    child_id,
                    day_str,
                    riddle.question,
                    riddle.answer,
                    riddle.hint,
                    riddle.points,
                    difficulty.as_str(),
                    now,
                ],
            )?;
            if inserted == 0 {
                debug!(
                    "[kidbank:riddle] Another caller created {}/{} first",
                    child_id, day_str
                );
            }
            load_in(tx, child_id, &day_str)?.ok_or_else(|| EconomyError::NoRiddleForDay {
                day: day_str.clone(),
            })
        })?;

        if stored.id == id {
            info!(
                "[kidbank:riddle] Created riddle {} for {} on {}",
                stored.id, child_id, day_str
            );
        }
        Ok(stored)
    }
}

fn child_age(conn: &Connection, child_id: &str) -> EconomyResult<Option<u32>> {
    conn.query_row(
        "SELECT age FROM children WHERE id = ?1",
        params![child_id],
        |r| r.get(0),
    )
    .optional()?
    .ok_or_else(|| EconomyError::ChildNotFound(child_id.to_string()))
}

/// Riddle for (child, day) inside the caller's connection or transaction
pub(crate) fn load_in(
    conn: &Connection,
    child_id: &str,
    day: &str,
) -> EconomyResult<Option<DailyArtifact>> {
    let riddle = conn
        .query_row(
            &format!("SELECT {RIDDLE_COLUMNS} FROM daily_riddles WHERE child_id = ?1 AND day = ?2"),
            params![child_id, day],
            map_riddle,
        )
        .optional()?;
    Ok(riddle)
}

pub(crate) fn mark_solved_in(conn: &Connection, riddle_id: &str, now_ms: i64) -> EconomyResult<()> {
    conn.execute(
        "UPDATE daily_riddles SET solved = 1, solved_at = ?1 WHERE id = ?2",
        params![now_ms, riddle_id],
    )?;
    Ok(())
}

fn map_riddle(row: &Row<'_>) -> rusqlite::Result<DailyArtifact> {
    let difficulty: String = row.get(7)?;
    Ok(DailyArtifact {
        id: row.get(0)?,
        child_id: row.get(1)?,
        day: row.get(2)?,
        question: row.get(3)?,
        answer: row.get(4)?,
        hint: row.get(5)?,
        points: row.get(6)?,
        difficulty: Difficulty::from_str(&difficulty).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                7,
                rusqlite::types::Type::Text,
                format!("unknown difficulty: {difficulty}").into(),
            )
        })?,
        solved: row.get(8)?,
        solved_at: row.get(9)?,
        created_at: row.get(10)?,
    })
}
