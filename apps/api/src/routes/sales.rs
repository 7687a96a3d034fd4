//! # Sale Routes
//!
//! - `POST /sales` registers a sale with its payments and optional shipment
//! - `GET /sales` lists summaries, newest first
//! - `GET /sales/{id}` returns the sale with items, payments and shipment

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use mostrador_core::{SaleDetail, SaleReceipt, SaleRequest, SaleSummary};
use tracing::debug;

use crate::error::ApiResult;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sales", get(list_sales).post(create_sale))
        .route("/sales/{id}", get(get_sale))
}

async fn create_sale(
    State(state): State<AppState>,
    payload: Result<Json<SaleRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SaleReceipt>)> {
    let Json(request) = payload?;
    debug!(
        operator_id = %request.operator_id,
        items = request.items.len(),
        payments = request.payments.len(),
        "create_sale"
    );

    let receipt = state.db.sales().create_sale(&request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn list_sales(State(state): State<AppState>) -> ApiResult<Json<Vec<SaleSummary>>> {
    Ok(Json(state.db.sales().list().await?))
}

async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleDetail>> {
    Ok(Json(state.db.sales().get(&id).await?))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{parse, TestApp};
    use axum::http::StatusCode;
    use mostrador_core::{SaleDetail, SaleReceipt, SaleSummary};
    use serde_json::json;

    fn cash_sale(product_id: &str, cents: i64) -> serde_json::Value {
        json!({
            "operator_id": "op-1",
            "items": [{ "product_id": product_id, "quantity": 1, "unit_price_cents": cents }],
            "payments": [{ "payment_type": "cash", "amount_cents": cents }]
        })
    }

    #[tokio::test]
    async fn test_create_sale_returns_receipt() {
        let app = TestApp::new().await;
        app.post(
            "/cash-sessions/open",
            json!({ "opening_balance_cents": 100_000, "operator_id": "op-1" }),
        )
        .await;

        let (status, body) = app.post("/sales", cash_sale(&app.product_id, 25_000)).await;
        assert_eq!(status, StatusCode::CREATED);

        let receipt: SaleReceipt = parse(body);
        assert_eq!(receipt.total_cents, 25_000);
        assert_eq!(receipt.payment_ids.len(), 1);
        assert!(receipt.cash_movement_recorded);
    }

    #[tokio::test]
    async fn test_mismatched_payments_rejected() {
        let app = TestApp::new().await;
        let body = json!({
            "operator_id": "op-1",
            "items": [{ "product_id": app.product_id, "quantity": 2, "unit_price_cents": 1_000 }],
            "payments": [{ "payment_type": "card", "amount_cents": 1_500 }]
        });

        let (status, error) = app.post("/sales", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["code"], "VALIDATION_ERROR");

        let (_, list) = app.get("/sales").await;
        assert_eq!(list.as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn test_malformed_body_is_validation_error() {
        let app = TestApp::new().await;
        let body = json!({ "operator_id": "op-1", "items": [], "payments": [{ "payment_type": "barter", "amount_cents": 1 }] });

        let (status, error) = app.post("/sales", body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_credit_over_limit_is_conflict() {
        let app = TestApp::new().await;
        let client_id = app.client(10_000).await;
        let body = json!({
            "operator_id": "op-1",
            "items": [{ "product_id": app.product_id, "quantity": 1, "unit_price_cents": 15_000 }],
            "payments": [{ "payment_type": "credit_account", "amount_cents": 15_000, "client_id": client_id }]
        });

        let (status, error) = app.post("/sales", body).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(error["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_list_and_get_sale() {
        let app = TestApp::new().await;
        let (_, first) = app.post("/sales", cash_sale(&app.product_id, 1_000)).await;
        let (_, second) = app.post("/sales", cash_sale(&app.product_id, 2_000)).await;
        let first: SaleReceipt = parse(first);
        let second: SaleReceipt = parse(second);

        let (status, list) = app.get("/sales").await;
        assert_eq!(status, StatusCode::OK);
        let list: Vec<SaleSummary> = parse(list);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, second.sale_id);

        let (status, detail) = app.get(&format!("/sales/{}", first.sale_id)).await;
        assert_eq!(status, StatusCode::OK);
        let detail: SaleDetail = parse(detail);
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.payments[0].amount_cents, 1_000);

        let (status, _) = app.get("/sales/does-not-exist").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
