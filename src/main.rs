use std::sync::Arc;

use log::info;
use teloxide::prelude::*;

mod commands;
mod config;
mod deployment;
mod format;
mod handlers;
mod jobs;
mod market;
mod news;
mod notify;

use config::BotConfig;
use deployment::{detect_deployment_mode, run_polling_mode, AppState, DeploymentMode};
use market::MoverService;

#[cfg(feature = "lambda")]
use deployment::run_lambda_mode;

#[cfg(feature = "axum-server")]
use deployment::run_webhook_mode;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();
    info!("Starting CSE movers bot...");

    let bot = match std::env::var("TELEGRAM_BOT_TOKEN") {
        Ok(token) => Bot::new(token),
        Err(_) => Bot::from_env(),
    };

    let config = BotConfig::from_env();
    let service = match MoverService::new(&config) {
        Ok(service) => Arc::new(service),
        Err(e) => panic!("Mover service failed to initialize: {e}"),
    };
    let state = AppState {
        bot,
        service,
        config: Arc::new(config),
    };

    let deployment_mode = detect_deployment_mode();
    info!("🚀 Bot deployment detection: {deployment_mode}");

    let result = match deployment_mode {
        DeploymentMode::Lambda => {
            #[cfg(feature = "lambda")]
            {
                run_lambda_mode(state).await
            }
            #[cfg(not(feature = "lambda"))]
            {
                panic!("Lambda environment detected but lambda feature not enabled. Compile with --features lambda");
            }
        }
        DeploymentMode::Webhook => {
            #[cfg(feature = "axum-server")]
            {
                run_webhook_mode(state).await
            }
            #[cfg(not(feature = "axum-server"))]
            {
                panic!("Production environment detected but axum-server feature not enabled. Compile with --features axum-server");
            }
        }
        DeploymentMode::Polling => {
            run_polling_mode(state).await;
            Ok(())
        }
    };

    if let Err(e) = result {
        panic!("Bot failed to start: {e}");
    }
}
