use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

use crate::auth::AuthenticatedUser;
use crate::AppState;

use super::error_response;

#[derive(Deserialize)]
pub struct CreateSubmissionRequest {
    pub job_id: i32,
    pub proof_url: String,
}

#[actix_web::post("/submissions")]
pub async fn create_submission(
    user: AuthenticatedUser,
    req: web::Json<CreateSubmissionRequest>,
    app_state: web::Data<AppState>,
) -> impl Responder {
    match ledger::submissions::create_submission(
        &app_state.pool,
        &app_state.policy,
        user.account_id,
        req.job_id,
        &req.proof_url,
    )
    .await
    {
        Ok(submission) => {
            app_state.metrics.submissions_created.inc();
            HttpResponse::Created().json(submission)
        }
        Err(err) => error_response(&err),
    }
}

#[actix_web::get("/submissions")]
pub async fn list_submissions(
    user: AuthenticatedUser,
    app_state: web::Data<AppState>,
) -> impl Responder {
    match ledger::submissions::list_for_account(&app_state.pool, user.account_id).await {
        Ok(submissions) => HttpResponse::Ok().json(submissions),
        Err(err) => error_response(&err),
    }
}
