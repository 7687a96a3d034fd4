//! # Credit Account Routes
//!
//! ```text
//! GET  /credit-accounts?filter=active|overdue|all   (default: active)
//! GET  /credit-accounts/{id}                        account + repayments
//! POST /credit-accounts/payments                    register a repayment
//! PUT  /credit-accounts/{id}/status                 manual status change
//! POST /credit-accounts/sweep-overdue[?as_of=]      flag past-due accounts
//! ```

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use mostrador_core::{
    CreditAccount, CreditAccountDetail, CreditAccountFilter, CreditAccountRow,
    CreditAccountStatus, Money, SweepReport,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiResult;
use crate::AppState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub filter: CreditAccountFilter,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentRequest {
    pub account_id: String,
    pub amount_cents: i64,
    pub operator_id: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRequest {
    pub status: CreditAccountStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepQuery {
    /// Date to sweep as of; today (UTC) when omitted.
    #[serde(default)]
    pub as_of: Option<NaiveDate>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/credit-accounts", get(list_accounts))
        .route("/credit-accounts/payments", post(register_payment))
        .route("/credit-accounts/sweep-overdue", post(sweep_overdue))
        .route("/credit-accounts/{id}", get(get_account))
        .route("/credit-accounts/{id}/status", put(set_status))
}

async fn list_accounts(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<CreditAccountRow>>> {
    let Query(query) = query?;
    Ok(Json(state.db.credit_accounts().list(query.filter).await?))
}

async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> ApiResult<Json<CreditAccountDetail>> {
    Ok(Json(state.db.credit_accounts().get(&account_id).await?))
}

async fn register_payment(
    State(state): State<AppState>,
    payload: Result<Json<RepaymentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreditAccountDetail>)> {
    let Json(request) = payload?;
    debug!(account_id = %request.account_id, amount_cents = request.amount_cents, "register_credit_payment");

    let detail = state
        .db
        .credit_accounts()
        .register_payment(
            &request.account_id,
            Money::from_cents(request.amount_cents),
            &request.operator_id,
            request.note.as_deref(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(detail)))
}

async fn set_status(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> ApiResult<Json<CreditAccount>> {
    let Json(request) = payload?;
    debug!(%account_id, to = request.status.as_str(), "set_credit_account_status");

    let account = state
        .db
        .credit_accounts()
        .set_status(&account_id, request.status)
        .await?;

    Ok(Json(account))
}

async fn sweep_overdue(
    State(state): State<AppState>,
    query: Result<Query<SweepQuery>, QueryRejection>,
) -> ApiResult<Json<SweepReport>> {
    let Query(query) = query?;
    let today = query.as_of.unwrap_or_else(|| Utc::now().date_naive());

    Ok(Json(state.db.credit_accounts().sweep_overdue(today).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{parse, TestApp};
    use chrono::Duration;
    use mostrador_core::SaleReceipt;
    use serde_json::json;

    async fn sell_on_credit(app: &TestApp, client_id: &str, cents: i64) -> String {
        let (status, body) = app
            .post(
                "/sales",
                json!({
                    "operator_id": "op-1",
                    "items": [{ "product_id": app.product_id, "quantity": 1, "unit_price_cents": cents }],
                    "payments": [{ "payment_type": "credit_account", "amount_cents": cents, "client_id": client_id }]
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let receipt: SaleReceipt = parse(body);
        receipt.credit_account_ids[0].clone()
    }

    #[tokio::test]
    async fn test_repayments_until_paid() {
        let app = TestApp::new().await;
        let client_id = app.client(50_000).await;
        let account_id = sell_on_credit(&app, &client_id, 30_000).await;

        let (status, body) = app
            .post(
                "/credit-accounts/payments",
                json!({ "account_id": account_id, "amount_cents": 10_000, "operator_id": "op-1", "note": "efectivo" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let detail: CreditAccountDetail = parse(body);
        assert_eq!(detail.account.outstanding_cents, 20_000);
        assert_eq!(detail.payments.len(), 1);

        // More than what is owed
        let (status, body) = app
            .post(
                "/credit-accounts/payments",
                json!({ "account_id": account_id, "amount_cents": 25_000, "operator_id": "op-1" }),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], "CONFLICT");

        let (_, body) = app
            .post(
                "/credit-accounts/payments",
                json!({ "account_id": account_id, "amount_cents": 20_000, "operator_id": "op-1" }),
            )
            .await;
        let detail: CreditAccountDetail = parse(body);
        assert_eq!(detail.account.outstanding_cents, 0);
        assert_eq!(detail.account.status, CreditAccountStatus::Paid);

        let (_, active) = app.get("/credit-accounts").await;
        let active: Vec<CreditAccountRow> = parse(active);
        assert!(active.is_empty());

        let (_, all) = app.get("/credit-accounts?filter=all").await;
        let all: Vec<CreditAccountRow> = parse(all);
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].client_name, "Marta Gomez");
    }

    #[tokio::test]
    async fn test_sweep_marks_overdue_once() {
        let app = TestApp::new().await;
        let client_id = app.client(50_000).await;
        let account_id = sell_on_credit(&app, &client_id, 12_000).await;

        let as_of = Utc::now().date_naive() + Duration::days(62);
        let uri = format!("/credit-accounts/sweep-overdue?as_of={}", as_of);

        let (status, first) = app.post(&uri, json!({})).await;
        assert_eq!(status, StatusCode::OK);
        let first: SweepReport = parse(first);
        assert_eq!(first.accounts_marked, 1);
        assert_eq!(first.clients_marked, 1);

        let (_, second) = app.post(&uri, json!({})).await;
        let second: SweepReport = parse(second);
        assert_eq!(second, SweepReport::default());

        let (_, overdue) = app.get("/credit-accounts?filter=overdue").await;
        let overdue: Vec<CreditAccountRow> = parse(overdue);
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].account.id, account_id);
    }

    #[tokio::test]
    async fn test_manual_status_change() {
        let app = TestApp::new().await;
        let client_id = app.client(50_000).await;
        let account_id = sell_on_credit(&app, &client_id, 5_000).await;

        let (status, body) = app
            .put(
                &format!("/credit-accounts/{}/status", account_id),
                json!({ "status": "paid" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        let account: CreditAccount = parse(body);
        assert_eq!(account.status, CreditAccountStatus::Paid);
        assert_eq!(account.outstanding_cents, 0);

        // Nothing left to owe, so it cannot go back to pending
        let (status, _) = app
            .put(
                &format!("/credit-accounts/{}/status", account_id),
                json!({ "status": "pending" }),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_bad_filter_and_unknown_account() {
        let app = TestApp::new().await;

        let (status, body) = app.get("/credit-accounts?filter=everything").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, _) = app.get("/credit-accounts/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
