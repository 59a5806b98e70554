use anyhow::Context;
use reqwest::Client;
use tracing::info;

use super::models::{
    BillingAddress, SubmitOrderRequest, SubmitOrderResponse, TokenRequest, TokenResponse,
    TransactionStatusResponse,
};
use crate::cents_to_decimal;

const PESAPAL_LIVE_URL: &str = "https://pay.pesapal.com/v3";
const PESAPAL_SANDBOX_URL: &str = "https://cybqa.pesapal.com/pesapalv3";

#[derive(Debug, Clone)]
pub struct PesapalClient {
    client: Client,
    base_url: String,
    consumer_key: String,
    consumer_secret: String,
    /// Registered IPN id; Pesapal requires it on every order.
    notification_id: String,
    callback_url: String,
}

impl PesapalClient {
    pub fn new(
        consumer_key: String,
        consumer_secret: String,
        notification_id: String,
        callback_url: String,
        sandbox: bool,
    ) -> Self {
        let base_url = if sandbox {
            PESAPAL_SANDBOX_URL
        } else {
            PESAPAL_LIVE_URL
        };

        PesapalClient {
            client: Client::new(),
            base_url: base_url.to_string(),
            consumer_key,
            consumer_secret,
            notification_id,
            callback_url,
        }
    }

    async fn access_token(&self) -> anyhow::Result<String> {
        let request = TokenRequest {
            consumer_key: &self.consumer_key,
            consumer_secret: &self.consumer_secret,
        };

        let response = self
            .client
            .post(format!("{}/api/Auth/RequestToken", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .context("pesapal token request rejected")?;

        let token: TokenResponse = response.json().await?;
        Ok(token.token)
    }

    /// Submits an order and returns the tracking id plus the redirect URL
    /// the payer completes the M-Pesa/card flow on.
    pub async fn submit_order(
        &self,
        amount_cents: i64,
        currency: &str,
        merchant_reference: &str,
        description: &str,
        payer_email: &str,
    ) -> anyhow::Result<SubmitOrderResponse> {
        let token = self.access_token().await?;

        let request = SubmitOrderRequest {
            id: merchant_reference.to_string(),
            currency: currency.to_string(),
            amount: cents_to_decimal(amount_cents),
            description: description.to_string(),
            callback_url: self.callback_url.clone(),
            notification_id: self.notification_id.clone(),
            billing_address: BillingAddress {
                email_address: payer_email.to_string(),
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/api/Transactions/SubmitOrderRequest",
                self.base_url
            ))
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await?
            .error_for_status()
            .context("pesapal order submission rejected")?;

        let order: SubmitOrderResponse = response.json().await?;
        info!(
            "submitted pesapal order {} for reference {}",
            order.order_tracking_id, order.merchant_reference
        );
        Ok(order)
    }

    /// Resolves what actually happened to an order. IPN deliveries carry no
    /// result, so both the IPN handler and the background poller call this
    /// and feed the answer to the reconciler.
    pub async fn transaction_status(
        &self,
        order_tracking_id: &str,
    ) -> anyhow::Result<TransactionStatusResponse> {
        let token = self.access_token().await?;

        let response = self
            .client
            .get(format!(
                "{}/api/Transactions/GetTransactionStatus",
                self.base_url
            ))
            .query(&[("orderTrackingId", order_tracking_id)])
            .bearer_auth(&token)
            .send()
            .await?
            .error_for_status()
            .context("pesapal status query rejected")?;

        let status: TransactionStatusResponse = response.json().await?;
        Ok(status)
    }
}
