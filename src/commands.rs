use std::sync::Arc;

use log::info;
use teloxide::{prelude::*, utils::command::BotCommands};

use crate::format::format_news;
use crate::jobs::{compose, Job};
use crate::market::MoverService;

/// Headlines shown for a bare `/news`
const NEWS_REPLY_LIMIT: usize = 8;

#[derive(BotCommands, Clone, Debug)]
#[command(
    rename_rule = "lowercase",
    description = "These commands are supported:"
)]
pub enum Command {
    #[command(description = "display this text.")]
    Help,
    #[command(description = "ranked day-trade movers from the CSE.")]
    Movers,
    #[command(description = "low-float, high-volume movers with related news.")]
    LowFloat,
    #[command(description = "swing watch headlines for the watchlist.")]
    Swing,
    #[command(description = "latest market news - use '/news LOLC.N' for one ticker.")]
    News(String),
}

pub async fn answer(bot: Bot, msg: Message, cmd: Command, service: Arc<MoverService>) -> ResponseResult<()> {
    let chat_type = match msg.chat.is_private() {
        true => "Private",
        false => match msg.chat.is_group() {
            true => "Group",
            false => match msg.chat.is_supergroup() {
                true => "Supergroup",
                false => "Channel",
            },
        },
    };

    let username = msg
        .from
        .as_ref()
        .and_then(|user| user.username.as_ref())
        .map(|s| s.as_str())
        .unwrap_or("<no_username>");

    info!(
        "📨 Received command in {} chat (ID: {}) from @{}: {:?}",
        chat_type, msg.chat.id, username, cmd
    );

    let job = match cmd {
        Command::Help => {
            let response = Command::descriptions().to_string();
            info!("📤 Sending help response to chat {}", msg.chat.id);
            bot.send_message(msg.chat.id, response).await?;
            return Ok(());
        }
        Command::News(symbol) => {
            bot.send_chat_action(msg.chat.id, teloxide::types::ChatAction::Typing).await?;

            let symbol = symbol.trim();
            let response = if symbol.is_empty() {
                let mut items = service.news().await;
                items.truncate(NEWS_REPLY_LIMIT);
                format_news(None, &items)
            } else {
                let items = service.news_for(symbol).await;
                format_news(Some(symbol), &items)
            };

            info!("📤 Sending news to chat {}", msg.chat.id);
            bot.send_message(msg.chat.id, response).await?;
            return Ok(());
        }
        Command::Movers => Job::Daytrade,
        Command::LowFloat => Job::LowFloat,
        Command::Swing => Job::Swing,
    };

    // Scraping and float lookups take a few seconds
    bot.send_chat_action(msg.chat.id, teloxide::types::ChatAction::Typing).await?;

    let (response, items) = compose(job, &service).await;
    info!("📤 Sending {job} reply to chat {} ({items} items)", msg.chat.id);
    bot.send_message(msg.chat.id, response).await?;

    Ok(())
}
