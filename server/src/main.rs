use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer, Responder};
use clap::{Parser, Subcommand};
use common::db::establish_connection;
use dotenv::dotenv;
use gateways::paypal::PayPalClient;
use gateways::pesapal::PesapalClient;
use ledger::policy::Policy;
use prometheus_client::registry::Registry;
use sqlx::{Pool, Postgres};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod auth;
mod config;
mod handlers;
mod metrics;

use auth::middleware::AuthenticationMiddleware;
use config::Config;
use metrics::Metrics;

pub struct AppState {
    pub pool: Pool<Postgres>,
    pub policy: Policy,
    pub config: Config,
    pub paypal: PayPalClient,
    pub pesapal: PesapalClient,
    pub metrics: Metrics,
    pub registry: Arc<Registry>,
}

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve,

    /// Apply the database schema and exit
    Migrate,
}

#[actix_web::get("/health")]
async fn health_check() -> impl Responder {
    HttpResponse::Ok().content_type("text/plain").body("OK")
}

#[actix_web::get("/metrics")]
async fn metrics_endpoint(app_state: web::Data<AppState>) -> impl Responder {
    let mut body = String::new();
    match prometheus_client::encoding::text::encode(&mut body, app_state.registry.as_ref()) {
        Ok(()) => HttpResponse::Ok()
            .content_type("application/openmetrics-text; version=1.0.0; charset=utf-8")
            .body(body),
        Err(_) => HttpResponse::InternalServerError().finish(),
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate => {
            let pool = establish_connection().await?;
            common::db::apply_schema(&pool).await?;
            info!("schema applied");
            Ok(())
        }
        Commands::Serve => {
            let config = Config::from_env().expect("failed to load configuration");
            let pool = establish_connection().await?;
            let policy = Policy::from_env();

            let paypal = PayPalClient::new(
                config.paypal_client_id.clone(),
                config.paypal_client_secret.clone(),
                config.paypal_sandbox,
            );
            let pesapal = PesapalClient::new(
                config.pesapal_consumer_key.clone(),
                config.pesapal_consumer_secret.clone(),
                config.pesapal_notification_id.clone(),
                config.pesapal_callback_url.clone(),
                config.pesapal_sandbox,
            );

            let mut registry = Registry::default();
            let metrics = Metrics::new(&mut registry);

            let address = config.server_address();
            let jwt_secret = config.jwt_secret.clone();
            let app_state = web::Data::new(AppState {
                pool,
                policy,
                config,
                paypal,
                pesapal,
                metrics,
                registry: Arc::new(registry),
            });

            info!("Starting HTTP server on {}", address);
            HttpServer::new(move || {
                App::new()
                    .app_data(app_state.clone())
                    .wrap(AuthenticationMiddleware::new(jwt_secret.clone()))
                    .wrap(Cors::permissive())
                    .wrap(Logger::default())
                    .service(health_check)
                    .service(metrics_endpoint)
                    .service(handlers::accounts::create_account)
                    .service(handlers::accounts::get_balances)
                    .service(handlers::accounts::list_ledger_entries)
                    .service(handlers::accounts::list_referrals)
                    .service(handlers::submissions::create_submission)
                    .service(handlers::submissions::list_submissions)
                    .service(handlers::withdrawals::request_withdrawal)
                    .service(handlers::withdrawals::list_withdrawals)
                    .service(handlers::payments::initiate_payment)
                    .service(handlers::payments::paypal_capture)
                    .service(handlers::payments::paypal_webhook)
                    .service(handlers::payments::pesapal_ipn)
                    .service(handlers::admin::list_pending_submissions)
                    .service(handlers::admin::review_submission)
                    .service(handlers::admin::list_withdrawals)
                    .service(handlers::admin::review_withdrawal)
                    .service(handlers::admin::account_ledger)
                    .service(handlers::admin::verify_account)
            })
            .bind(address)?
            .run()
            .await?;

            Ok(())
        }
    }
}
