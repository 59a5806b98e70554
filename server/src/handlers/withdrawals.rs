use actix_web::{web, HttpResponse, Responder};
use common::utils::Bucket;
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthenticatedUser;
use crate::AppState;

use super::error_response;

#[derive(Deserialize)]
pub struct RequestWithdrawalRequest {
    pub amount_cents: i64,
    pub bucket: Bucket,
    pub payment_method: String,
    #[serde(default)]
    pub payment_details: serde_json::Value,
}

#[actix_web::post("/withdrawals")]
pub async fn request_withdrawal(
    user: AuthenticatedUser,
    req: web::Json<RequestWithdrawalRequest>,
    app_state: web::Data<AppState>,
) -> impl Responder {
    let req = req.into_inner();
    info!(
        "withdrawal request from account {}: {} cents from {} bucket",
        user.account_id, req.amount_cents, req.bucket
    );

    match ledger::withdrawals::request_withdrawal(
        &app_state.pool,
        &app_state.policy,
        user.account_id,
        req.amount_cents,
        req.bucket,
        &req.payment_method,
        req.payment_details,
    )
    .await
    {
        Ok(request) => {
            app_state.metrics.withdrawals_requested.inc();
            HttpResponse::Created().json(request)
        }
        Err(err) => error_response(&err),
    }
}

#[actix_web::get("/withdrawals")]
pub async fn list_withdrawals(
    user: AuthenticatedUser,
    app_state: web::Data<AppState>,
) -> impl Responder {
    match ledger::withdrawals::list_for_account(&app_state.pool, user.account_id).await {
        Ok(requests) => HttpResponse::Ok().json(requests),
        Err(err) => error_response(&err),
    }
}
