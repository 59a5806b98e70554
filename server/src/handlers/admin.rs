use actix_web::{web, HttpResponse, Responder};
use common::utils::WithdrawalStatus;
use ledger::submissions::ReviewDecision;
use ledger::withdrawals::WithdrawalDecision;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::auth::AdminUser;
use crate::AppState;

use super::error_response;

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

#[actix_web::get("/admin/submissions")]
pub async fn list_pending_submissions(
    _admin: AdminUser,
    query: web::Query<ListQuery>,
    app_state: web::Data<AppState>,
) -> impl Responder {
    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    match ledger::submissions::list_pending(&app_state.pool, limit).await {
        Ok(submissions) => HttpResponse::Ok().json(submissions),
        Err(err) => error_response(&err),
    }
}

#[derive(Deserialize)]
pub struct ReviewSubmissionRequest {
    pub decision: ReviewDecision,
    pub feedback: Option<String>,
}

#[actix_web::post("/admin/submissions/{id}/review")]
pub async fn review_submission(
    admin: AdminUser,
    path: web::Path<i32>,
    req: web::Json<ReviewSubmissionRequest>,
    app_state: web::Data<AppState>,
) -> impl Responder {
    let submission_id = path.into_inner();
    let req = req.into_inner();
    info!(
        "admin {} reviewing submission {}: {:?}",
        admin.account_id, submission_id, req.decision
    );

    match ledger::submissions::review_submission(
        &app_state.pool,
        submission_id,
        req.decision,
        admin.account_id,
        req.feedback,
    )
    .await
    {
        Ok(submission) => {
            app_state.metrics.submissions_reviewed.inc();
            HttpResponse::Ok().json(submission)
        }
        Err(err) => error_response(&err),
    }
}

#[actix_web::get("/admin/withdrawals")]
pub async fn list_withdrawals(
    _admin: AdminUser,
    query: web::Query<ListQuery>,
    app_state: web::Data<AppState>,
) -> impl Responder {
    let status = match query.status.as_deref() {
        Some(raw) => match raw.parse::<WithdrawalStatus>() {
            Ok(status) => Some(status),
            Err(_) => {
                return HttpResponse::BadRequest()
                    .json(json!({ "error": format!("unknown withdrawal status {:?}", raw) }))
            }
        },
        None => None,
    };
    let limit = query.limit.unwrap_or(50).clamp(1, 500);

    match ledger::withdrawals::list_by_status(&app_state.pool, status, limit).await {
        Ok(requests) => HttpResponse::Ok().json(requests),
        Err(err) => error_response(&err),
    }
}

#[derive(Deserialize)]
pub struct ReviewWithdrawalRequest {
    pub decision: WithdrawalDecision,
    pub notes: Option<String>,
}

#[actix_web::post("/admin/withdrawals/{id}/review")]
pub async fn review_withdrawal(
    admin: AdminUser,
    path: web::Path<i32>,
    req: web::Json<ReviewWithdrawalRequest>,
    app_state: web::Data<AppState>,
) -> impl Responder {
    let withdrawal_id = path.into_inner();
    let req = req.into_inner();
    info!(
        "admin {} reviewing withdrawal {}: {:?}",
        admin.account_id, withdrawal_id, req.decision
    );

    match ledger::withdrawals::review_withdrawal(
        &app_state.pool,
        withdrawal_id,
        req.decision,
        admin.account_id,
        req.notes,
    )
    .await
    {
        Ok(request) => {
            app_state.metrics.withdrawals_reviewed.inc();
            HttpResponse::Ok().json(request)
        }
        Err(err) => error_response(&err),
    }
}

#[actix_web::get("/admin/accounts/{id}/ledger")]
pub async fn account_ledger(
    _admin: AdminUser,
    path: web::Path<i32>,
    app_state: web::Data<AppState>,
) -> impl Responder {
    match ledger::entries::list_entries(&app_state.pool, path.into_inner(), 500).await {
        Ok(entries) => HttpResponse::Ok().json(entries),
        Err(err) => error_response(&err),
    }
}

/// Replays an account's entry log and diffs it against the stored balances.
#[actix_web::get("/admin/accounts/{id}/verify")]
pub async fn verify_account(
    _admin: AdminUser,
    path: web::Path<i32>,
    app_state: web::Data<AppState>,
) -> impl Responder {
    match ledger::replay::verify_account(&app_state.pool, path.into_inner()).await {
        Ok(report) => {
            let in_sync = report.in_sync();
            HttpResponse::Ok().json(json!({
                "report": report,
                "in_sync": in_sync,
            }))
        }
        Err(err) => error_response(&err),
    }
}
