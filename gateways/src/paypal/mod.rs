pub mod models;
pub mod paypal_client;

pub use paypal_client::PayPalClient;
