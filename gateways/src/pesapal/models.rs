use serde::{Deserialize, Serialize};

use crate::GatewayPaymentState;

#[derive(Serialize)]
pub struct TokenRequest<'a> {
    pub consumer_key: &'a str,
    pub consumer_secret: &'a str,
}

#[derive(Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Serialize)]
pub struct SubmitOrderRequest {
    /// Our merchant reference; echoed back on the IPN.
    pub id: String,
    pub currency: String,
    /// Decimal string amount, e.g. "30.00".
    pub amount: String,
    pub description: String,
    pub callback_url: String,
    pub notification_id: String,
    pub billing_address: BillingAddress,
}

#[derive(Serialize)]
pub struct BillingAddress {
    pub email_address: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitOrderResponse {
    pub order_tracking_id: String,
    pub merchant_reference: String,
    pub redirect_url: String,
}

/// Answer to a transaction status query; also what an IPN delivery is
/// resolved into, since Pesapal IPNs carry no result themselves.
#[derive(Debug, Deserialize)]
pub struct TransactionStatusResponse {
    pub payment_status_description: String,
    pub merchant_reference: String,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub confirmation_code: Option<String>,
}

impl TransactionStatusResponse {
    pub fn payment_state(&self) -> GatewayPaymentState {
        map_status(&self.payment_status_description)
    }
}

/// Pesapal status descriptions to the gateway-agnostic state. The
/// comparison is case-insensitive because the docs and the sandbox disagree
/// on casing.
pub fn map_status(description: &str) -> GatewayPaymentState {
    match description.to_ascii_lowercase().as_str() {
        "completed" => GatewayPaymentState::Completed,
        "failed" | "invalid" => GatewayPaymentState::Failed,
        "reversed" => GatewayPaymentState::Cancelled,
        _ => GatewayPaymentState::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_is_case_insensitive() {
        assert_eq!(map_status("COMPLETED"), GatewayPaymentState::Completed);
        assert_eq!(map_status("Completed"), GatewayPaymentState::Completed);
        assert_eq!(map_status("Failed"), GatewayPaymentState::Failed);
        assert_eq!(map_status("INVALID"), GatewayPaymentState::Failed);
        assert_eq!(map_status("Reversed"), GatewayPaymentState::Cancelled);
        assert_eq!(map_status("Pending"), GatewayPaymentState::Pending);
        assert_eq!(map_status("something-new"), GatewayPaymentState::Pending);
    }
}
