use anyhow::Context;
use reqwest::Client;
use tracing::info;

use super::models::{
    AccessTokenResponse, CaptureResponse, CreateOrderRequest, OrderAmount, OrderResponse,
    PurchaseUnit,
};
use crate::cents_to_decimal;

const PAYPAL_LIVE_URL: &str = "https://api-m.paypal.com";
const PAYPAL_SANDBOX_URL: &str = "https://api-m.sandbox.paypal.com";

#[derive(Debug, Clone)]
pub struct PayPalClient {
    client: Client,
    base_url: String,
    client_id: String,
    client_secret: String,
}

impl PayPalClient {
    pub fn new(client_id: String, client_secret: String, sandbox: bool) -> Self {
        let base_url = if sandbox {
            PAYPAL_SANDBOX_URL
        } else {
            PAYPAL_LIVE_URL
        };

        PayPalClient {
            client: Client::new(),
            base_url: base_url.to_string(),
            client_id,
            client_secret,
        }
    }

    async fn access_token(&self) -> anyhow::Result<String> {
        let response = self
            .client
            .post(format!("{}/v1/oauth2/token", self.base_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?
            .error_for_status()
            .context("paypal token request rejected")?;

        let token: AccessTokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// Creates a checkout order for a membership purchase and returns the
    /// order id plus the payer's approval URL.
    pub async fn create_order(
        &self,
        amount_cents: i64,
        currency: &str,
        merchant_reference: &str,
    ) -> anyhow::Result<OrderResponse> {
        let token = self.access_token().await?;

        let request = CreateOrderRequest {
            intent: "CAPTURE".to_string(),
            purchase_units: vec![PurchaseUnit {
                reference_id: merchant_reference.to_string(),
                amount: OrderAmount {
                    currency_code: currency.to_string(),
                    value: cents_to_decimal(amount_cents),
                },
            }],
        };

        let response = self
            .client
            .post(format!("{}/v2/checkout/orders", self.base_url))
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .context("paypal order creation rejected")?;

        let order: OrderResponse = response.json().await?;
        info!("created paypal order {} ({})", order.id, order.status);
        Ok(order)
    }

    /// Captures an approved order. Safe to call again for an already
    /// captured order: PayPal answers with the terminal status, which the
    /// reconciler absorbs as a duplicate.
    pub async fn capture_order(&self, order_id: &str) -> anyhow::Result<CaptureResponse> {
        let token = self.access_token().await?;

        let response = self
            .client
            .post(format!(
                "{}/v2/checkout/orders/{}/capture",
                self.base_url, order_id
            ))
            .bearer_auth(&token)
            .header("Content-Type", "application/json")
            .body("{}")
            .send()
            .await?
            .error_for_status()
            .context("paypal capture rejected")?;

        let capture: CaptureResponse = response.json().await?;
        info!("captured paypal order {}: {}", capture.id, capture.status);
        Ok(capture)
    }
}
