use std::env;

use serde::Serialize;
use tracing::{error, info};

#[derive(Serialize)]
struct NotifyRequest<'a> {
    user_id: i32,
    title: &'a str,
    message: &'a str,
    kind: &'a str,
}

/// Fire-and-forget delivery to the notification sink. A failure here is
/// logged and swallowed: the ledger mutation that triggered the
/// notification has already committed and must never be rolled back or
/// failed because the sink is down.
pub async fn notify(user_id: i32, title: &str, message: &str, kind: &str) {
    let url = match env::var("NOTIFY_WEBHOOK_URL") {
        Ok(url) => url,
        Err(_) => {
            info!("notification sink not configured, dropping: [{}] {}", kind, title);
            return;
        }
    };

    let request = NotifyRequest {
        user_id,
        title,
        message,
        kind,
    };

    let client = reqwest::Client::new();
    match client.post(&url).json(&request).send().await {
        Ok(response) if !response.status().is_success() => {
            error!(
                "notification sink returned {} for user {}",
                response.status(),
                user_id
            );
        }
        Ok(_) => {}
        Err(err) => {
            error!("failed to reach notification sink: {}", err);
        }
    }
}
