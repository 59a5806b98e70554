use actix_web::HttpResponse;
use ledger::LedgerError;
use serde_json::json;
use tracing::error;

pub mod accounts;
pub mod admin;
pub mod payments;
pub mod submissions;
pub mod withdrawals;

/// Maps the ledger's failure taxonomy onto HTTP. Business rejections keep
/// their specific message; infra faults are logged with context and answered
/// with a generic retry-later body.
pub fn error_response(err: &LedgerError) -> HttpResponse {
    match err {
        LedgerError::AccountNotFound(_)
        | LedgerError::SubmissionNotFound(_)
        | LedgerError::WithdrawalNotFound(_)
        | LedgerError::PaymentNotFound(_)
        | LedgerError::JobNotFound(_) => {
            HttpResponse::NotFound().json(json!({ "error": err.to_string() }))
        }
        LedgerError::InsufficientFunds { .. }
        | LedgerError::BelowMinimum { .. }
        | LedgerError::TierRequired(_)
        | LedgerError::DailyLimitReached
        | LedgerError::Validation(_) => {
            HttpResponse::BadRequest().json(json!({ "error": err.to_string() }))
        }
        LedgerError::PendingWithdrawalExists { .. }
        | LedgerError::InvalidStateTransition { .. }
        | LedgerError::DuplicateSubmission => {
            HttpResponse::Conflict().json(json!({ "error": err.to_string() }))
        }
        LedgerError::Database(db_err) => {
            error!("database error handling request: {}", db_err);
            HttpResponse::InternalServerError()
                .json(json!({ "error": "something went wrong, please try again later" }))
        }
    }
}
