use serde::{Deserialize, Serialize};

use crate::GatewayPaymentState;

#[derive(Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: u64,
}

#[derive(Serialize)]
pub struct CreateOrderRequest {
    /// Always "CAPTURE": the money is taken as soon as the payer approves.
    pub intent: String,
    pub purchase_units: Vec<PurchaseUnit>,
}

#[derive(Serialize)]
pub struct PurchaseUnit {
    /// Our merchant reference; PayPal echoes it back on capture so events
    /// can be tied to the internal payment record.
    pub reference_id: String,
    pub amount: OrderAmount,
}

#[derive(Serialize)]
pub struct OrderAmount {
    pub currency_code: String,
    /// Decimal string, e.g. "12.50".
    pub value: String,
}

#[derive(Debug, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub links: Vec<OrderLink>,
}

#[derive(Debug, Deserialize)]
pub struct OrderLink {
    pub href: String,
    pub rel: String,
}

impl OrderResponse {
    /// The URL the payer is redirected to for approval.
    pub fn approval_url(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|link| link.rel == "approve" || link.rel == "payer-action")
            .map(|link| link.href.as_str())
    }
}

#[derive(Debug, Deserialize)]
pub struct CaptureResponse {
    pub id: String,
    pub status: String,
}

impl CaptureResponse {
    pub fn payment_state(&self) -> GatewayPaymentState {
        map_status(&self.status)
    }
}

/// PayPal order statuses to the gateway-agnostic state.
pub fn map_status(status: &str) -> GatewayPaymentState {
    match status {
        "COMPLETED" | "APPROVED" => GatewayPaymentState::Completed,
        "VOIDED" => GatewayPaymentState::Cancelled,
        "DECLINED" | "FAILED" => GatewayPaymentState::Failed,
        _ => GatewayPaymentState::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_covers_the_capture_vocabulary() {
        assert_eq!(map_status("COMPLETED"), GatewayPaymentState::Completed);
        assert_eq!(map_status("VOIDED"), GatewayPaymentState::Cancelled);
        assert_eq!(map_status("DECLINED"), GatewayPaymentState::Failed);
        assert_eq!(map_status("CREATED"), GatewayPaymentState::Pending);
        assert_eq!(map_status("PAYER_ACTION_REQUIRED"), GatewayPaymentState::Pending);
    }

    #[test]
    fn approval_url_picks_the_approve_link() {
        let order = OrderResponse {
            id: "5O190127TN364715T".to_string(),
            status: "CREATED".to_string(),
            links: vec![
                OrderLink {
                    href: "https://api.sandbox.paypal.com/v2/checkout/orders/5O1".to_string(),
                    rel: "self".to_string(),
                },
                OrderLink {
                    href: "https://www.sandbox.paypal.com/checkoutnow?token=5O1".to_string(),
                    rel: "approve".to_string(),
                },
            ],
        };

        assert_eq!(
            order.approval_url(),
            Some("https://www.sandbox.paypal.com/checkoutnow?token=5O1")
        );
    }
}
