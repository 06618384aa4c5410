//! Natural-language webhook bridge.
//!
//! Sends a message to the conversational webhook and handles its reply
//! list: plain `text` entries are printed, `custom` entries are intent
//! commands applied to the local schedule.

use chrono::Utc;
use clap::Args;
use daybeat_core::{intent, IntentCommand};
use serde::{Deserialize, Serialize};

use crate::state;

#[derive(Args)]
pub struct ChatArgs {
    /// Message to send
    pub message: String,
    /// Webhook endpoint; defaults to DAYBEAT_WEBHOOK_URL
    #[arg(long)]
    pub url: Option<String>,
    /// Sender name reported to the webhook
    #[arg(long, default_value = "cli")]
    pub sender: String,
}

#[derive(Debug, Serialize)]
struct WebhookRequest<'a> {
    sender: &'a str,
    message: &'a str,
}

/// One entry of a webhook reply.
#[derive(Debug, Deserialize)]
pub(crate) struct WebhookMessage {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub custom: Option<serde_json::Value>,
}

pub(crate) async fn exchange(
    client: &reqwest::Client,
    url: &str,
    sender: &str,
    message: &str,
) -> Result<Vec<WebhookMessage>, Box<dyn std::error::Error>> {
    let response = client
        .post(url)
        .json(&WebhookRequest { sender, message })
        .send()
        .await?
        .error_for_status()?;
    Ok(response.json().await?)
}

pub async fn run(args: ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let url = args
        .url
        .or_else(|| std::env::var("DAYBEAT_WEBHOOK_URL").ok())
        .ok_or("no webhook endpoint; pass --url or set DAYBEAT_WEBHOOK_URL")?;

    let client = reqwest::Client::new();
    let replies = exchange(&client, &url, &args.sender, &args.message).await?;
    if replies.is_empty() {
        println!("(no reply)");
        return Ok(());
    }

    for reply in replies {
        if let Some(text) = reply.text {
            println!("{text}");
        }
        if let Some(custom) = reply.custom {
            let command: IntentCommand = serde_json::from_value(custom)?;
            let mut store = state::load_store()?;
            let outcome = intent::apply(&mut store, command, Utc::now())?;
            state::save_store(&store)?;
            println!("{}", outcome.message);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn exchange_posts_sender_and_message() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/hook")
            .match_body(Matcher::Json(json!({
                "sender": "cli",
                "message": "remind me to stretch",
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"text": "Got it"},
                    {"custom": {"action": "add_reminder", "data": {"name": "Stretch"}}}
                ]"#,
            )
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/hook", server.url());
        let replies = exchange(&client, &url, "cli", "remind me to stretch").await.unwrap();

        mock.assert_async().await;
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].text.as_deref(), Some("Got it"));
        assert!(replies[0].custom.is_none());

        let command: IntentCommand =
            serde_json::from_value(replies[1].custom.clone().unwrap()).unwrap();
        assert!(matches!(
            command,
            IntentCommand::AddReminder { ref name, .. } if name.as_deref() == Some("Stretch")
        ));
    }

    #[tokio::test]
    async fn error_status_fails_the_exchange() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/hook")
            .with_status(502)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/hook", server.url());
        assert!(exchange(&client, &url, "cli", "hello").await.is_err());
    }

    #[tokio::test]
    async fn reply_entries_tolerate_unknown_fields() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/hook")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"recipient_id": "cli", "text": "Hi"}]"#)
            .create_async()
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/hook", server.url());
        let replies = exchange(&client, &url, "cli", "hello").await.unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].text.as_deref(), Some("Hi"));
    }
}
