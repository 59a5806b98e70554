use std::{env, time::Duration};

use common::db::establish_connection;
use gateways::pesapal::PesapalClient;
use gateways::GatewayPaymentState;
use ledger::policy::Policy;
use ledger::reconcile::{self, CaptureStatus};
use tokio::time::sleep;
use tracing::{error, info};

fn capture_status(state: GatewayPaymentState) -> CaptureStatus {
    match state {
        GatewayPaymentState::Completed => CaptureStatus::Completed,
        GatewayPaymentState::Failed => CaptureStatus::Failed,
        GatewayPaymentState::Cancelled => CaptureStatus::Cancelled,
        GatewayPaymentState::Pending => CaptureStatus::Pending,
    }
}

/// Pesapal confirms by IPN, but deliveries get lost and the sandbox is
/// flaky, so this worker re-queries every open order and feeds the answer
/// through the same reconciler the IPN handler uses. Reconciliation is
/// idempotent, which is what makes polling on top of IPNs safe.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();
    info!("Starting the payment status poller");

    let poll_secs = env::var("IPN_POLL_SECONDS")
        .unwrap_or_else(|_| "30".to_string())
        .parse::<u64>()
        .expect("IPN_POLL_SECONDS must be a number of seconds");

    let pesapal = PesapalClient::new(
        env::var("PESAPAL_CONSUMER_KEY").expect("PESAPAL_CONSUMER_KEY must be set"),
        env::var("PESAPAL_CONSUMER_SECRET").expect("PESAPAL_CONSUMER_SECRET must be set"),
        env::var("PESAPAL_NOTIFICATION_ID").expect("PESAPAL_NOTIFICATION_ID must be set"),
        env::var("PESAPAL_CALLBACK_URL").unwrap_or_default(),
        env::var("PESAPAL_SANDBOX")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .expect("PESAPAL_SANDBOX must be true or false"),
    );
    let policy = Policy::from_env();
    let pool = establish_connection().await?;

    loop {
        match reconcile::list_open_pesapal(&pool, 50).await {
            Ok(payments) => {
                for payment in payments {
                    let tracking_id = match payment.gateway_order_id.as_deref() {
                        Some(id) => id,
                        None => continue,
                    };

                    match pesapal.transaction_status(tracking_id).await {
                        Ok(status) => {
                            let mapped = capture_status(status.payment_state());
                            if mapped == CaptureStatus::Pending {
                                continue;
                            }
                            match reconcile::reconcile_payment_event(
                                &pool,
                                &policy,
                                &payment.merchant_reference,
                                mapped,
                            )
                            .await
                            {
                                Ok(outcome) => info!(
                                    "reconciled payment {}: {:?}",
                                    payment.merchant_reference, outcome
                                ),
                                Err(err) => error!(
                                    "failed to reconcile payment {}: {}",
                                    payment.merchant_reference, err
                                ),
                            }
                        }
                        Err(err) => {
                            error!("status query for order {} failed: {}", tracking_id, err)
                        }
                    }
                }
            }
            Err(err) => error!("failed to list open payments: {}", err),
        }

        sleep(Duration::from_secs(poll_secs)).await;
    }
}
