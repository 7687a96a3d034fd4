//! # Cash Session Routes
//!
//! ```text
//! POST /cash-sessions/open             → 201 CashSession   (409 if one is open)
//! POST /cash-sessions/close            → CashSession       (409 if already closed)
//! GET  /cash-sessions/current          → CashSession | null
//! GET  /cash-sessions/last             → CashSession | null
//! POST /cash-sessions/{id}/movements   → 201 CashMovement  (manual entry)
//! GET  /cash-sessions/{id}/movements   → [CashMovement]
//! GET  /cash-sessions/{id}/detail      → session + movements + totals
//! ```

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use mostrador_core::{reconcile::CashSessionDetail, CashMovement, CashSession, Money, MovementDirection};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenSessionRequest {
    /// Business date; today (UTC) when omitted.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    pub opening_balance_cents: i64,
    pub operator_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseSessionRequest {
    pub session_id: String,
    pub closing_balance_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementRequest {
    pub direction: MovementDirection,
    pub amount_cents: i64,
    #[serde(default)]
    pub description: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cash-sessions/open", post(open_session))
        .route("/cash-sessions/close", post(close_session))
        .route("/cash-sessions/current", get(current_session))
        .route("/cash-sessions/last", get(last_session))
        .route(
            "/cash-sessions/{id}/movements",
            get(list_movements).post(record_movement),
        )
        .route("/cash-sessions/{id}/detail", get(session_detail))
}

async fn open_session(
    State(state): State<AppState>,
    payload: Result<Json<OpenSessionRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CashSession>)> {
    let Json(request) = payload?;
    let date = request.date.unwrap_or_else(|| Utc::now().date_naive());
    debug!(%date, operator_id = %request.operator_id, "open_session");

    let session = state
        .db
        .cash_sessions()
        .open(
            date,
            Money::from_cents(request.opening_balance_cents),
            &request.operator_id,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(session)))
}

async fn close_session(
    State(state): State<AppState>,
    payload: Result<Json<CloseSessionRequest>, JsonRejection>,
) -> ApiResult<Json<CashSession>> {
    let Json(request) = payload?;
    debug!(session_id = %request.session_id, "close_session");

    let session = state
        .db
        .cash_sessions()
        .close(
            &request.session_id,
            Money::from_cents(request.closing_balance_cents),
        )
        .await?;

    Ok(Json(session))
}

async fn current_session(State(state): State<AppState>) -> ApiResult<Json<Option<CashSession>>> {
    Ok(Json(state.db.cash_sessions().current().await?))
}

async fn last_session(State(state): State<AppState>) -> ApiResult<Json<Option<CashSession>>> {
    Ok(Json(state.db.cash_sessions().last().await?))
}

async fn record_movement(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    payload: Result<Json<MovementRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CashMovement>)> {
    let Json(request) = payload?;
    debug!(%session_id, direction = request.direction.as_str(), "record_movement");

    let movement = state
        .db
        .cash_movements()
        .record(
            &session_id,
            request.direction,
            Money::from_cents(request.amount_cents),
            &request.description,
            None,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(movement)))
}

async fn list_movements(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<Vec<CashMovement>>> {
    Ok(Json(state.db.cash_movements().list(&session_id).await?))
}

async fn session_detail(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<CashSessionDetail>> {
    Ok(Json(state.db.cash_movements().detail(&session_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{parse, TestApp};
    use serde_json::{json, Value};

    async fn open(app: &TestApp, cents: i64) -> CashSession {
        let (status, body) = app
            .post(
                "/cash-sessions/open",
                json!({ "date": "2026-03-02", "opening_balance_cents": cents, "operator_id": "op-1" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        parse(body)
    }

    #[tokio::test]
    async fn test_current_is_null_without_session() {
        let app = TestApp::new().await;

        let (status, body) = app.get("/cash-sessions/current").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);

        let (_, body) = app.get("/cash-sessions/last").await;
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn test_second_open_conflicts() {
        let app = TestApp::new().await;
        let session = open(&app, 50_000).await;
        assert_eq!(session.business_date, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());

        let (status, body) = app
            .post(
                "/cash-sessions/open",
                json!({ "opening_balance_cents": 0, "operator_id": "op-2" }),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let (_, current) = app.get("/cash-sessions/current").await;
        let current: CashSession = parse(current);
        assert_eq!(current.id, session.id);
    }

    #[tokio::test]
    async fn test_movements_and_close_reconcile() {
        let app = TestApp::new().await;
        let session = open(&app, 100_000).await;

        let (status, _) = app
            .post(
                &format!("/cash-sessions/{}/movements", session.id),
                json!({ "direction": "out", "amount_cents": 20_000, "description": "Proveedor" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, closed) = app
            .post(
                "/cash-sessions/close",
                json!({ "session_id": session.id, "closing_balance_cents": 79_000 }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let closed: CashSession = parse(closed);
        assert!(!closed.is_open());

        let (_, detail) = app.get(&format!("/cash-sessions/{}/detail", session.id)).await;
        let detail: CashSessionDetail = parse(detail);
        assert_eq!(detail.movements.len(), 1);
        assert_eq!(detail.totals.expected_final_cents, 80_000);
        assert_eq!(detail.totals.difference_cents, Some(-1_000));

        // Closed sessions take no entries and cannot be closed twice
        let (status, _) = app
            .post(
                &format!("/cash-sessions/{}/movements", session.id),
                json!({ "direction": "in", "amount_cents": 100 }),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = app
            .post(
                "/cash-sessions/close",
                json!({ "session_id": session.id, "closing_balance_cents": 79_000 }),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, last) = app.get("/cash-sessions/last").await;
        let last: CashSession = parse(last);
        assert_eq!(last.id, session.id);
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let app = TestApp::new().await;

        let (status, _) = app.get("/cash-sessions/missing/movements").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .post(
                "/cash-sessions/close",
                json!({ "session_id": "missing", "closing_balance_cents": 0 }),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_non_positive_movement_rejected() {
        let app = TestApp::new().await;
        let session = open(&app, 0).await;

        let (status, body) = app
            .post(
                &format!("/cash-sessions/{}/movements", session.id),
                json!({ "direction": "in", "amount_cents": 0 }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
}
