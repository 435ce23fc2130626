use futures::future::join_all;
use log::{info, warn};
use serde_json::Value;
use teloxide::prelude::*;
use teloxide::types::{ChatId, Recipient};

/// Shown for `GET /api/send`
pub const SEND_USAGE: &str = r#"Use POST with JSON body: {"chatId":"...","text":"..."}"#;
/// Returned with 400 when a send request lacks a chat or text
pub const SEND_MISSING_FIELDS: &str = r#"Missing chatId/text. Example body: {"chatId":"123","text":"hi"}"#;

/// Delivery failure for a broadcast that reached nobody
#[derive(Debug, thiserror::Error)]
#[error("Telegram delivery failed for all {attempted} chats: {first_error}")]
pub struct DeliveryError {
    pub attempted: usize,
    pub first_error: String,
}

/// Numeric ids are chats, anything else is a channel username
pub fn recipient(chat_id: &str) -> Recipient {
    match chat_id.trim().parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(chat_id.trim().to_string()),
    }
}

/// Chat and text of a relay request. `chatId` may be a string or a number;
/// both fields must be non-empty.
pub fn send_target(body: &Value) -> Option<(String, String)> {
    let chat_id = match body.get("chatId")? {
        Value::String(id) => id.trim().to_string(),
        Value::Number(id) => id.to_string(),
        _ => return None,
    };
    let text = body.get("text")?.as_str()?;
    if chat_id.is_empty() || text.trim().is_empty() {
        return None;
    }
    Some((chat_id, text.to_string()))
}

/// Send one message to a single chat
pub async fn relay(bot: &Bot, chat_id: &str, text: &str) -> Result<Message, teloxide::RequestError> {
    let message = bot.send_message(recipient(chat_id), text).await?;
    info!("📤 Relayed message to chat {chat_id}");
    Ok(message)
}

/// Send one plain-text message to every chat concurrently.
///
/// Returns the number of chats reached. Individual failures are logged; the
/// broadcast fails only when no chat could be reached.
pub async fn broadcast(bot: &Bot, chat_ids: &[String], text: &str) -> Result<usize, DeliveryError> {
    let results = join_all(chat_ids.iter().map(|id| async move {
        let result = bot.send_message(recipient(id), text).await;
        (id, result)
    }))
    .await;

    let mut sent = 0;
    let mut first_error = None;
    for (id, result) in results {
        match result {
            Ok(_) => {
                sent += 1;
                info!("📤 Broadcast delivered to chat {id}");
            }
            Err(e) => {
                warn!("❌ Broadcast to chat {id} failed: {e}");
                first_error.get_or_insert_with(|| e.to_string());
            }
        }
    }

    match first_error {
        Some(first_error) if sent == 0 => Err(DeliveryError {
            attempted: chat_ids.len(),
            first_error,
        }),
        _ => Ok(sent),
    }
}
