//! # Payment Routes
//!
//! - `GET /payments?sale_id=` lists a sale's payments
//! - `PUT /payments/{id}/status` moves a payment through its state machine;
//!   the response carries any drawer entries the change produced

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    routing::{get, put},
    Json, Router,
};
use mostrador_core::{Payment, PaymentStatus, PaymentTransition};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentsQuery {
    pub sale_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRequest {
    pub status: PaymentStatus,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payments", get(list_payments))
        .route("/payments/{id}/status", put(change_status))
}

async fn list_payments(
    State(state): State<AppState>,
    query: Result<Query<PaymentsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Payment>>> {
    let Query(query) = query?;
    Ok(Json(state.db.payments().list_for_sale(&query.sale_id).await?))
}

async fn change_status(
    State(state): State<AppState>,
    Path(payment_id): Path<String>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> ApiResult<Json<PaymentTransition>> {
    let Json(request) = payload?;
    debug!(%payment_id, to = request.status.as_str(), "change_payment_status");

    let transition = state
        .db
        .payments()
        .change_status(&payment_id, request.status)
        .await?;

    Ok(Json(transition))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{parse, TestApp};
    use axum::http::StatusCode;
    use mostrador_core::{reconcile::CashSessionDetail, CashSession, MovementDirection, SaleReceipt};
    use serde_json::json;

    async fn sell(app: &TestApp, status: &str, cents: i64) -> SaleReceipt {
        let (status_code, body) = app
            .post(
                "/sales",
                json!({
                    "operator_id": "op-1",
                    "items": [{ "product_id": app.product_id, "quantity": 1, "unit_price_cents": cents }],
                    "payments": [{ "payment_type": "cash", "amount_cents": cents, "status": status }]
                }),
            )
            .await;
        assert_eq!(status_code, StatusCode::CREATED);
        parse(body)
    }

    async fn open_session(app: &TestApp) -> CashSession {
        let (_, body) = app
            .post(
                "/cash-sessions/open",
                json!({ "opening_balance_cents": 100_000, "operator_id": "op-1" }),
            )
            .await;
        parse(body)
    }

    #[tokio::test]
    async fn test_list_requires_sale_id() {
        let app = TestApp::new().await;

        let (status, body) = app.get("/payments").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_void_processed_cash_refunds_drawer() {
        let app = TestApp::new().await;
        let session = open_session(&app).await;
        let receipt = sell(&app, "processed", 10_000).await;

        let (status, payments) = app.get(&format!("/payments?sale_id={}", receipt.sale_id)).await;
        assert_eq!(status, StatusCode::OK);
        let payments: Vec<Payment> = parse(payments);
        assert_eq!(payments.len(), 1);

        let (status, body) = app
            .put(
                &format!("/payments/{}/status", payments[0].id),
                json!({ "status": "voided" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let transition: PaymentTransition = parse(body);
        assert_eq!(transition.previous_status, PaymentStatus::Processed);
        assert_eq!(transition.payment.status, PaymentStatus::Voided);
        assert_eq!(transition.movements.len(), 1);
        assert_eq!(transition.movements[0].direction, MovementDirection::Out);

        let (_, detail) = app.get(&format!("/cash-sessions/{}/detail", session.id)).await;
        let detail: CashSessionDetail = parse(detail);
        assert_eq!(detail.totals.expected_final_cents, 100_000);
    }

    #[tokio::test]
    async fn test_pending_to_processed_enters_drawer_once() {
        let app = TestApp::new().await;
        open_session(&app).await;
        let receipt = sell(&app, "pending", 4_000).await;
        assert!(!receipt.cash_movement_recorded);

        let uri = format!("/payments/{}/status", receipt.payment_ids[0]);

        let (_, first) = app.put(&uri, json!({ "status": "processed" })).await;
        let first: PaymentTransition = parse(first);
        assert_eq!(first.movements.len(), 1);
        assert_eq!(first.movements[0].direction, MovementDirection::In);

        let (status, again) = app.put(&uri, json!({ "status": "processed" })).await;
        assert_eq!(status, StatusCode::OK);
        let again: PaymentTransition = parse(again);
        assert!(again.movements.is_empty());
    }

    #[tokio::test]
    async fn test_refund_without_session_conflicts() {
        let app = TestApp::new().await;
        let receipt = sell(&app, "processed", 2_500).await;

        let (status, body) = app
            .put(
                &format!("/payments/{}/status", receipt.payment_ids[0]),
                json!({ "status": "cancelled" }),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_unknown_payment_is_not_found() {
        let app = TestApp::new().await;

        let (status, _) = app
            .put("/payments/missing/status", json!({ "status": "voided" }))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
