use dotenv::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    // Server configuration
    pub server_host: String,
    pub server_port: u16,

    // Security
    pub jwt_secret: String,
    /// Shared secret for HMAC-signed gateway webhook deliveries.
    pub callback_secret: String,

    // Gateway credentials
    pub paypal_client_id: String,
    pub paypal_client_secret: String,
    pub paypal_sandbox: bool,
    pub pesapal_consumer_key: String,
    pub pesapal_consumer_secret: String,
    pub pesapal_notification_id: String,
    pub pesapal_callback_url: String,
    pub pesapal_sandbox: bool,

    pub currency: String,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .expect("SERVER_PORT must be a valid port number");

        let jwt_secret =
            env::var("JWT_SECRET").expect("JWT_SECRET must be set for secure operation");
        let callback_secret = env::var("CALLBACK_SECRET")
            .expect("CALLBACK_SECRET must be set to verify gateway webhooks");

        let paypal_client_id = env::var("PAYPAL_CLIENT_ID")?;
        let paypal_client_secret = env::var("PAYPAL_CLIENT_SECRET")?;
        let paypal_sandbox = env::var("PAYPAL_SANDBOX")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .expect("PAYPAL_SANDBOX must be true or false");

        let pesapal_consumer_key = env::var("PESAPAL_CONSUMER_KEY")?;
        let pesapal_consumer_secret = env::var("PESAPAL_CONSUMER_SECRET")?;
        let pesapal_notification_id = env::var("PESAPAL_NOTIFICATION_ID")?;
        let pesapal_callback_url = env::var("PESAPAL_CALLBACK_URL")
            .unwrap_or_else(|_| "http://localhost:8080/payments/pesapal/return".to_string());
        let pesapal_sandbox = env::var("PESAPAL_SANDBOX")
            .unwrap_or_else(|_| "true".to_string())
            .parse::<bool>()
            .expect("PESAPAL_SANDBOX must be true or false");

        let currency = env::var("CURRENCY").unwrap_or_else(|_| "USD".to_string());

        Ok(Config {
            server_host,
            server_port,
            jwt_secret,
            callback_secret,
            paypal_client_id,
            paypal_client_secret,
            paypal_sandbox,
            pesapal_consumer_key,
            pesapal_consumer_secret,
            pesapal_notification_id,
            pesapal_callback_url,
            pesapal_sandbox,
            currency,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
