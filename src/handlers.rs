use std::sync::Arc;

use log::info;

#[cfg(feature = "lambda")]
use log::warn;
use teloxide::{prelude::*, utils::command::BotCommands};

#[cfg(feature = "lambda")]
use lambda_runtime::{Error as LambdaError, LambdaEvent};
#[cfg(feature = "lambda")]
use serde_json::Value;

use crate::commands::{answer, Command};
use crate::market::MoverService;

#[cfg(feature = "lambda")]
use crate::deployment::AppState;

pub async fn handle_message(bot: Bot, msg: Message, service: Arc<MoverService>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        info!("📷 Received non-text message");
        return Ok(());
    };

    let bot_user = bot.get_me().await?;
    let bot_username = bot_user.username.as_deref().unwrap_or("bot");

    let bot_mention = format!("@{bot_username}");
    let is_private_chat = msg.chat.is_private();
    let is_mentioned = text.contains(&bot_mention);

    // In groups only commands addressed to the bot are handled
    if !is_private_chat && !is_mentioned && !text.starts_with('/') {
        info!("😶 Group message without bot mention - ignoring");
        return Ok(());
    }

    let processed_text = text.replace(&bot_mention, "").trim().to_string();
    info!("📝 Processing message: '{processed_text}'");

    if let Ok(cmd) = Command::parse(&processed_text, bot_username) {
        info!("✅ Command parsed successfully: {cmd:?}");
        answer(bot, msg, cmd, service).await?;
    } else if processed_text.starts_with('/') {
        info!("❌ Unknown command: '{processed_text}'");
        let response = format!(
            "Unknown command: {}\n\nAvailable commands:\n{}",
            processed_text,
            Command::descriptions()
        );
        bot.send_message(msg.chat.id, response).await?;
    } else if is_private_chat || is_mentioned {
        let response = format!(
            "Hello! I track CSE movers. Send me a command.\n\n{}",
            Command::descriptions()
        );
        bot.send_message(msg.chat.id, response).await?;
    }
    Ok(())
}

/// Lambda entry: a scheduled event `{"job": "daytrade"}` or an API Gateway
/// event carrying a Telegram update in `body`
#[cfg(feature = "lambda")]
pub async fn lambda_handler(event: LambdaEvent<Value>, state: AppState) -> Result<Value, LambdaError> {
    info!("🔗 Lambda received event: {:?}", event.payload);

    if let Some(job) = event.payload.get("job").and_then(|j| j.as_str()) {
        let job: crate::jobs::Job = job.parse()?;
        let report = crate::jobs::run_job(job, &state.service, &state.bot, &state.config).await?;
        return Ok(serde_json::to_value(report)?);
    }

    if let Some(body) = event.payload.get("body").and_then(|b| b.as_str()) {
        info!("📦 Extracted body from Lambda event: {body}");

        if let Ok(update) = serde_json::from_str::<teloxide::types::Update>(body) {
            info!("✅ Successfully parsed Telegram update: {:?}", update.id);

            if let teloxide::types::UpdateKind::Message(message) = update.kind {
                let _ = handle_message(state.bot.clone(), message, state.service.clone()).await;
            } else {
                info!("🔄 Received non-message update in Lambda");
            }
        } else {
            warn!("❌ Failed to parse Telegram update from body: {body}");
        }
    } else {
        warn!("❌ No job or body field found in Lambda event");
    }

    Ok(serde_json::json!({
        "statusCode": 200,
        "body": "OK"
    }))
}
