pub mod models;
pub mod pesapal_client;

pub use pesapal_client::PesapalClient;
