use actix_web::{web, HttpRequest, HttpResponse, Responder};
use common::utils::{MembershipTier, PaymentGateway};
use gateways::{paypal, signature, GatewayPaymentState};
use ledger::reconcile::{self, CaptureStatus, ReconcileOutcome};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::auth::AuthenticatedUser;
use crate::AppState;

use super::error_response;

fn capture_status(state: GatewayPaymentState) -> CaptureStatus {
    match state {
        GatewayPaymentState::Completed => CaptureStatus::Completed,
        GatewayPaymentState::Failed => CaptureStatus::Failed,
        GatewayPaymentState::Cancelled => CaptureStatus::Cancelled,
        GatewayPaymentState::Pending => CaptureStatus::Pending,
    }
}

async fn run_reconcile(
    app_state: &AppState,
    merchant_reference: &str,
    status: CaptureStatus,
) -> HttpResponse {
    match reconcile::reconcile_payment_event(
        &app_state.pool,
        &app_state.policy,
        merchant_reference,
        status,
    )
    .await
    {
        Ok(ReconcileOutcome::AlreadyProcessed) => {
            app_state.metrics.duplicate_gateway_events.inc();
            HttpResponse::Ok().json(json!({ "status": "already_processed" }))
        }
        Ok(outcome) => {
            app_state.metrics.payments_reconciled.inc();
            HttpResponse::Ok().json(json!({ "status": format!("{:?}", outcome).to_lowercase() }))
        }
        Err(err) => error_response(&err),
    }
}

#[derive(Deserialize)]
pub struct InitiatePaymentRequest {
    pub gateway: PaymentGateway,
    pub tier: MembershipTier,
}

/// Starts a membership purchase: creates the internal payment record, then
/// the gateway order, and hands the payer the redirect URL. If the gateway
/// rejects the order the payment is marked failed and the caller gets a
/// degraded-operation error. Nothing half-created is left behind.
#[actix_web::post("/payments")]
pub async fn initiate_payment(
    user: AuthenticatedUser,
    req: web::Json<InitiatePaymentRequest>,
    app_state: web::Data<AppState>,
) -> impl Responder {
    let account = match ledger::accounts::get_account(&app_state.pool, user.account_id).await {
        Ok(account) => account,
        Err(err) => return error_response(&err),
    };

    let payment = match reconcile::create_payment(
        &app_state.pool,
        &app_state.policy,
        user.account_id,
        req.gateway,
        req.tier,
        &app_state.config.currency,
    )
    .await
    {
        Ok(payment) => payment,
        Err(err) => return error_response(&err),
    };

    let order = match req.gateway {
        PaymentGateway::Paypal => app_state
            .paypal
            .create_order(
                payment.amount_cents,
                &payment.currency,
                &payment.merchant_reference,
            )
            .await
            .map(|order| {
                let redirect = order.approval_url().unwrap_or_default().to_string();
                (order.id, redirect)
            }),
        PaymentGateway::Pesapal => app_state
            .pesapal
            .submit_order(
                payment.amount_cents,
                &payment.currency,
                &payment.merchant_reference,
                &format!("{} membership", payment.plan_tier),
                &account.email,
            )
            .await
            .map(|order| (order.order_tracking_id, order.redirect_url)),
    };

    let (gateway_order_id, redirect_url) = match order {
        Ok(order) => order,
        Err(err) => {
            error!(
                "gateway order creation failed for payment {}: {}",
                payment.merchant_reference, err
            );
            if let Err(err) = reconcile::mark_unstartable(&app_state.pool, payment.id).await {
                error!("failed to mark payment {} failed: {}", payment.id, err);
            }
            return HttpResponse::BadGateway()
                .json(json!({ "error": "payment gateway is unavailable, please try again later" }));
        }
    };

    if let Err(err) =
        reconcile::attach_gateway_order(&app_state.pool, payment.id, &gateway_order_id).await
    {
        return error_response(&err);
    }

    app_state.metrics.payments_initiated.inc();
    HttpResponse::Created().json(json!({
        "merchant_reference": payment.merchant_reference,
        "gateway_order_id": gateway_order_id,
        "redirect_url": redirect_url,
    }))
}

#[derive(Deserialize)]
pub struct PayPalCaptureQuery {
    /// PayPal puts the order id in `token` on the return redirect.
    pub token: String,
}

/// PayPal return URL: the payer approved, so capture the order and
/// reconcile whatever status the capture reports. Re-visiting this URL is
/// harmless: the reconciler absorbs the duplicate.
#[actix_web::get("/payments/paypal/capture")]
pub async fn paypal_capture(
    query: web::Query<PayPalCaptureQuery>,
    app_state: web::Data<AppState>,
) -> impl Responder {
    let capture = match app_state.paypal.capture_order(&query.token).await {
        Ok(capture) => capture,
        Err(err) => {
            error!("paypal capture for order {} failed: {}", query.token, err);
            return HttpResponse::BadGateway()
                .json(json!({ "error": "payment gateway is unavailable, please try again later" }));
        }
    };

    let payment = match reconcile::find_by_gateway_order(&app_state.pool, &capture.id).await {
        Ok(payment) => payment,
        Err(err) => return error_response(&err),
    };

    run_reconcile(
        &app_state,
        &payment.merchant_reference,
        capture_status(capture.payment_state()),
    )
    .await
}

#[derive(Deserialize)]
pub struct PayPalWebhookEvent {
    pub merchant_reference: String,
    pub status: String,
}

/// Signed webhook path for server-to-server capture events. The raw body is
/// HMAC-verified against the shared callback secret before anything is
/// parsed or touched.
#[actix_web::post("/payments/paypal/webhook")]
pub async fn paypal_webhook(
    http_req: HttpRequest,
    body: web::Bytes,
    app_state: web::Data<AppState>,
) -> impl Responder {
    let provided = http_req
        .headers()
        .get("X-Callback-Signature")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if !signature::verify(&body, provided, &app_state.config.callback_secret) {
        warn!("webhook delivery with bad signature rejected");
        return HttpResponse::Unauthorized().json(json!({ "error": "invalid signature" }));
    }

    let event: PayPalWebhookEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(err) => {
            warn!("unparseable webhook payload: {}", err);
            return HttpResponse::BadRequest().json(json!({ "error": "invalid payload" }));
        }
    };

    info!(
        "paypal webhook for {}: {}",
        event.merchant_reference, event.status
    );
    run_reconcile(
        &app_state,
        &event.merchant_reference,
        capture_status(paypal::models::map_status(&event.status)),
    )
    .await
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PesapalIpnQuery {
    pub order_tracking_id: String,
    pub order_merchant_reference: String,
}

/// Pesapal IPN: the notification itself carries no result, only the order
/// tracking id, so the outcome is fetched back from Pesapal and then
/// reconciled. Pesapal re-delivers until it sees a 200 ack, which is also
/// our retry mechanism for transient internal failures.
#[actix_web::get("/payments/pesapal/ipn")]
pub async fn pesapal_ipn(
    query: web::Query<PesapalIpnQuery>,
    app_state: web::Data<AppState>,
) -> impl Responder {
    let status = match app_state
        .pesapal
        .transaction_status(&query.order_tracking_id)
        .await
    {
        Ok(status) => status,
        Err(err) => {
            error!(
                "pesapal status query for {} failed: {}",
                query.order_tracking_id, err
            );
            return HttpResponse::BadGateway()
                .json(json!({ "error": "payment gateway is unavailable, please try again later" }));
        }
    };

    info!(
        "pesapal ipn for {}: {}",
        status.merchant_reference, status.payment_status_description
    );
    let response = run_reconcile(
        &app_state,
        &status.merchant_reference,
        capture_status(status.payment_state()),
    )
    .await;

    if response.status().is_success() {
        // Ack shape Pesapal expects before it stops re-delivering.
        HttpResponse::Ok().json(json!({
            "orderNotificationType": "IPNCHANGE",
            "orderTrackingId": query.order_tracking_id,
            "orderMerchantReference": query.order_merchant_reference,
            "status": 200,
        }))
    } else {
        response
    }
}
