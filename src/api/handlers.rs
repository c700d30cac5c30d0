//! Request routing and handlers for the control API
//!
//! Handlers work on plain (method, path, body) values so they can be driven
//! without a socket. The server loop in `mod.rs` does the tiny_http I/O.

use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::ApiState;
use super::types::{
    PiggyRequest, PointsRequest, RewardRequest, ShopRequest, SolveRequest,
    VerifyCodeRequest,
};
use crate::domain::NewChild;
use crate::error::EconomyError;

const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Failure of a single API request
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("not found")]
    NotFound,
    #[error("internal error: {0}")]
    Internal(String),
    #[error(transparent)]
    Economy(#[from] EconomyError),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::NotFound => 404,
            Self::Internal(_) => 500,
            Self::Economy(e) => economy_status(e),
        }
    }

    pub fn body(&self) -> Value {
        match self {
            Self::BadRequest(message) => json!({ "error": "bad_request", "message": message }),
            Self::NotFound => json!({ "error": "not_found" }),
            Self::Internal(message) => json!({ "error": "internal", "message": message }),
            Self::Economy(e) => {
                let mut body = json!({ "error": e.kind(), "message": e.to_string() });
                match e {
                    EconomyError::LockedOut { remaining } => {
                        // Round up so clients never retry a moment too early
                        let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
                        body["retry_after_secs"] = json!(secs);
                    }
                    EconomyError::InvalidCode { attempts_remaining } => {
                        body["attempts_remaining"] = json!(attempts_remaining);
                    }
                    EconomyError::InsufficientFunds { balance, required } => {
                        body["balance"] = json!(balance);
                        body["required"] = json!(required);
                    }
                    _ => {}
                }
                body
            }
        }
    }
}

fn economy_status(e: &EconomyError) -> u16 {
    match e {
        EconomyError::InsufficientFunds { .. } => 402,
        EconomyError::AlreadySolved | EconomyError::AlreadyClaimed { .. } => 409,
        EconomyError::LockedOut { .. } => 423,
        EconomyError::InvalidCode { .. } | EconomyError::ParentCodeRequired => 401,
        EconomyError::GenerationFailed(_) => 502,
        EconomyError::ConcurrentConflict { .. } => 503,
        EconomyError::ChildNotFound(_)
        | EconomyError::NoRiddleForDay { .. }
        | EconomyError::NoHintContext
        | EconomyError::GateNotConfigured(_) => 404,
        EconomyError::IncorrectAnswer
        | EconomyError::InvalidAmount(_)
        | EconomyError::InvalidCodeFormat(_) => 400,
        EconomyError::Hashing(_) | EconomyError::Storage(_) => 500,
    }
}

pub type HandlerResult = Result<(u16, Value), ApiError>;

/// Dispatch one request. `url` may carry a query string.
pub fn route(state: &ApiState, method: &str, url: &str, body: &str) -> HandlerResult {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    match (method, segments.as_slice()) {
        ("GET", ["ping"]) => Ok((
            200,
            json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }),
        )),

        ("POST", ["children"]) => create_child(state, parse_body(body)?),
        ("GET", ["children", id]) => ok(state.economy.children().get(id)?),
        ("DELETE", ["children", id]) => {
            let guardian_id = query_param(query, "guardian_id")
                .filter(|g| !g.is_empty())
                .ok_or_else(|| ApiError::BadRequest("guardian_id is required".to_string()))?;
            delete_child(state, guardian_id, id)
        }

        ("GET", ["children", id, "history"]) => {
            let limit = query_param(query, "limit")
                .map(|v| {
                    v.parse::<usize>()
                        .map_err(|_| ApiError::BadRequest(format!("invalid limit: {v}")))
                })
                .transpose()?
                .unwrap_or(DEFAULT_HISTORY_LIMIT);
            let entries = state.economy.ledger().history(id, limit)?;
            Ok((200, json!({ "entries": entries })))
        }
        ("GET", ["children", id, "streak"]) => ok(state.economy.streak_info(id)?),

        ("POST", ["children", id, "tasks"]) => {
            let req: PointsRequest = parse_body(body)?;
            let reason = req.reason.as_deref().unwrap_or("task");
            let balance = state.economy.complete_task(id, req.points, reason)?;
            Ok((200, json!({ "balance": balance })))
        }
        ("POST", ["children", id, "rewards"]) => {
            let req: RewardRequest = parse_body(body)?;
            let balance = state.economy.claim_reward(id, &req.reward_id, req.cost)?;
            Ok((200, json!({ "balance": balance })))
        }
        ("POST", ["children", id, "penalties"]) => {
            let req: PointsRequest = parse_body(body)?;
            let reason = req.reason.as_deref().unwrap_or("penalty");
            ok(state.economy.apply_penalty(id, req.points, reason)?)
        }

        ("GET", ["children", id, "riddle"]) => {
            let riddle = state.runtime.block_on(state.economy.daily_riddle(id))?;
            ok(riddle.view())
        }
        ("POST", ["children", id, "riddle", "solve"]) => {
            let req: SolveRequest = parse_body(body)?;
            let today = state.economy.today();
            ok(state.economy.solve_riddle(id, today, &req.answer)?)
        }
        ("POST", ["children", id, "riddle", "hint"]) => {
            let today = state.economy.today();
            ok(state.economy.purchase_hint(id, today)?)
        }

        ("POST", ["children", id, "piggy"]) => {
            let req: PiggyRequest = parse_body(body)?;
            let balance = state.economy.piggy_bank_transaction(
                id,
                req.kind,
                req.amount,
                req.parent_code.as_deref(),
            )?;
            Ok((200, json!({ "balance": balance })))
        }
        ("POST", ["children", id, "shop"]) => {
            let req: ShopRequest = parse_body(body)?;
            let balance = state.economy.shop_purchase(id, &req.item, req.price)?;
            Ok((200, json!({ "balance": balance })))
        }

        ("POST", ["gate", subject, "verify"]) => {
            let req: VerifyCodeRequest = parse_body(body)?;
            state.economy.verify_parent_code(subject, &req.code)?;
            Ok((200, json!({ "status": "ok" })))
        }

        _ => Err(ApiError::NotFound),
    }
}

fn create_child(state: &ApiState, new: NewChild) -> HandlerResult {
    if new.guardian_id.trim().is_empty() || new.name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "guardian_id and name are required".to_string(),
        ));
    }
    let child = state.economy.children().create(new)?;
    let (_, body) = ok(child)?;
    Ok((201, body))
}

/// Delete only when `guardian_id` owns the child; other guardians see 404
fn delete_child(state: &ApiState, guardian_id: &str, id: &str) -> HandlerResult {
    state.economy.children().delete(guardian_id, id)?;
    Ok((200, json!({ "status": "deleted", "id": id })))
}

fn ok<T: serde::Serialize>(value: T) -> HandlerResult {
    serde_json::to_value(value)
        .map(|v| (200, v))
        .map_err(|e| ApiError::Internal(format!("serialize: {e}")))
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::BadRequest(format!("invalid body: {e}")))
}

fn query_param<'a>(query: &'a str, key: &str) -> Option<&'a str> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::NaiveDate;

    use crate::clock::ManualClock;
    use crate::config::Config;
    use crate::db::EconomyDb;
    use crate::economy::Economy;
    use crate::riddle::RiddleBank;

    fn state() -> (ApiState, tokio::runtime::Runtime) {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        let economy = Economy::new(
            EconomyDb::open_in_memory().unwrap(),
            Arc::new(ManualClock::at_day(
                NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            )),
            Arc::new(RiddleBank::new()),
            &Config::default(),
        );
        let state = ApiState::new(economy, runtime.handle().clone());
        route(
            &state,
            "POST",
            "/children",
            r#"{"guardian_id":"g1","name":"Ada","id":"c1","age":9,"initial_balance":10}"#,
        )
        .unwrap();
        (state, runtime)
    }

    #[test]
    fn test_ping_and_unknown_route() {
        let (state, _rt) = state();
        let (status, body) = route(&state, "GET", "/ping", "").unwrap();
        assert_eq!(status, 200);
        assert_eq!(body["status"], "ok");

        let err = route(&state, "GET", "/nope", "").unwrap_err();
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn test_error_status_mapping() {
        let (state, _rt) = state();
        let err = route(&state, "POST", "/children/c1/shop", r#"{"item":"kite","price":50}"#)
            .unwrap_err();
        assert_eq!(err.status(), 402);
        assert_eq!(err.body()["error"], "insufficient_funds");
        assert_eq!(err.body()["balance"], 10);

        let err = route(&state, "POST", "/children/c1/shop", "not json").unwrap_err();
        assert_eq!(err.status(), 400);

        let err = route(&state, "GET", "/children/ghost", "").unwrap_err();
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn test_duplicate_claim_is_conflict() {
        let (state, _rt) = state();
        let body = r#"{"reward_id":"r1","cost":3}"#;
        let (_, ok) = route(&state, "POST", "/children/c1/rewards", body).unwrap();
        assert_eq!(ok["balance"], 7);
        let err = route(&state, "POST", "/children/c1/rewards", body).unwrap_err();
        assert_eq!(err.status(), 409);
    }

    #[test]
    fn test_gate_lockout_reports_retry_after() {
        let (state, _rt) = state();
        state.economy.gate().set_code("g1", "2468").unwrap();

        for _ in 0..2 {
            let err = route(&state, "POST", "/gate/g1/verify", r#"{"code":"0000"}"#).unwrap_err();
            assert_eq!(err.status(), 401);
        }
        let err = route(&state, "POST", "/gate/g1/verify", r#"{"code":"0000"}"#).unwrap_err();
        assert_eq!(err.status(), 423);
        assert_eq!(err.body()["retry_after_secs"], 300);
    }

    #[test]
    fn test_riddle_view_hides_answer_and_hint_is_billed() {
        let (state, _rt) = state();
        let (status, riddle) = route(&state, "GET", "/children/c1/riddle", "").unwrap();
        assert_eq!(status, 200);
        assert!(riddle.get("answer").is_none());
        assert!(riddle.get("hint").is_none());

        let (_, receipt) = route(&state, "POST", "/children/c1/riddle/hint", "").unwrap();
        assert_eq!(receipt["charged"], true);
        assert_eq!(receipt["balance"], 5);
        let (_, again) = route(&state, "POST", "/children/c1/riddle/hint", "").unwrap();
        assert_eq!(again["charged"], false);
    }

    #[test]
    fn test_history_limit() {
        let (state, _rt) = state();
        for _ in 0..3 {
            route(&state, "POST", "/children/c1/tasks", r#"{"points":1}"#).unwrap();
        }
        let (_, body) = route(&state, "GET", "/children/c1/history?limit=2", "").unwrap();
        assert_eq!(body["entries"].as_array().unwrap().len(), 2);

        let err = route(&state, "GET", "/children/c1/history?limit=x", "").unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn test_delete_child_requires_owning_guardian() {
        let (state, _rt) = state();

        let err = route(&state, "DELETE", "/children/c1", "").unwrap_err();
        assert_eq!(err.status(), 400);

        let err = route(&state, "DELETE", "/children/c1?guardian_id=g2", "").unwrap_err();
        assert_eq!(err.status(), 404);
        assert!(route(&state, "GET", "/children/c1", "").is_ok());

        let (status, body) =
            route(&state, "DELETE", "/children/c1?guardian_id=g1", "").unwrap();
        assert_eq!(status, 200);
        assert_eq!(body["status"], "deleted");
        assert_eq!(route(&state, "GET", "/children/c1", "").unwrap_err().status(), 404);
    }

    #[test]
    fn test_piggy_savings_without_code() {
        let (state, _rt) = state();
        let err = route(
            &state,
            "POST",
            "/children/c1/piggy",
            r#"{"type":"savings","amount":5}"#,
        )
        .unwrap_err();
        assert_eq!(err.status(), 401);
        assert_eq!(err.body()["error"], "parent_code_required");
    }
}
