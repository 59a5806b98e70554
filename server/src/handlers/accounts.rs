use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use tracing::info;

use crate::auth::AuthenticatedUser;
use crate::AppState;

use super::error_response;

#[derive(Deserialize)]
pub struct CreateAccountRequest {
    pub email: String,
    pub display_name: String,
    pub referral_code: Option<String>,
}

#[actix_web::post("/accounts")]
pub async fn create_account(
    req: web::Json<CreateAccountRequest>,
    app_state: web::Data<AppState>,
) -> impl Responder {
    info!("signup request for {}", req.email);

    match ledger::accounts::create_account(
        &app_state.pool,
        &req.email,
        &req.display_name,
        req.referral_code.as_deref(),
    )
    .await
    {
        Ok(account) => HttpResponse::Created().json(account),
        Err(err) => error_response(&err),
    }
}

#[actix_web::get("/balances")]
pub async fn get_balances(user: AuthenticatedUser, app_state: web::Data<AppState>) -> impl Responder {
    match ledger::accounts::get_balances(&app_state.pool, user.account_id).await {
        Ok(balances) => HttpResponse::Ok().json(balances),
        Err(err) => error_response(&err),
    }
}

#[actix_web::get("/ledger-entries")]
pub async fn list_ledger_entries(
    user: AuthenticatedUser,
    app_state: web::Data<AppState>,
) -> impl Responder {
    match ledger::entries::list_entries(&app_state.pool, user.account_id, 100).await {
        Ok(entries) => HttpResponse::Ok().json(entries),
        Err(err) => error_response(&err),
    }
}

#[actix_web::get("/referrals")]
pub async fn list_referrals(user: AuthenticatedUser, app_state: web::Data<AppState>) -> impl Responder {
    match ledger::referrals::list_for_referrer(&app_state.pool, user.account_id).await {
        Ok(referrals) => HttpResponse::Ok().json(referrals),
        Err(err) => error_response(&err),
    }
}
