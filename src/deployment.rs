use std::env;
use std::sync::Arc;

use log::info;
use teloxide::prelude::*;

#[cfg(feature = "axum-server")]
use axum::{routing::get, routing::post, Router};

#[cfg(feature = "lambda")]
use lambda_runtime::service_fn;

use crate::config::BotConfig;
use crate::handlers::handle_message;
use crate::market::MoverService;

#[cfg(feature = "lambda")]
use crate::handlers::lambda_handler;

/// Shared state handed to every entry point
#[derive(Clone)]
pub struct AppState {
    pub bot: Bot,
    pub service: Arc<MoverService>,
    pub config: Arc<BotConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    Lambda,
    Webhook,
    Polling,
}

impl std::fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeploymentMode::Lambda => write!(f, "AWS LAMBDA"),
            DeploymentMode::Webhook => write!(f, "WEBHOOK (Production)"),
            DeploymentMode::Polling => write!(f, "POLLING (Development)"),
        }
    }
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, key: &str, value: &str) -> bool {
    lookup(key).map(|v| v == value).unwrap_or(false)
}

pub fn is_lambda_environment(lookup: &impl Fn(&str) -> Option<String>) -> bool {
    lookup("AWS_LAMBDA_FUNCTION_NAME").is_some()
        || lookup("LAMBDA_RUNTIME_API").is_some()
        || flag(lookup, "LAMBDA_MODE", "true")
}

pub fn is_production_environment(lookup: &impl Fn(&str) -> Option<String>) -> bool {
    lookup("RAILWAY_ENVIRONMENT").is_some()
        || lookup("HEROKU_APP_NAME").is_some()
        || lookup("VERCEL").is_some()
        || flag(lookup, "ENVIRONMENT", "production")
        || flag(lookup, "DEPLOYMENT_ENV", "production")
        // PORT + WEBHOOK_URL is what most cloud providers set
        || (lookup("PORT").is_some() && lookup("WEBHOOK_URL").is_some())
        || flag(lookup, "WEBHOOK_MODE", "true")
        || is_lambda_environment(lookup)
}

pub fn detect_deployment_mode_with(lookup: impl Fn(&str) -> Option<String>) -> DeploymentMode {
    if is_lambda_environment(&lookup) {
        DeploymentMode::Lambda
    } else if is_production_environment(&lookup) {
        DeploymentMode::Webhook
    } else {
        DeploymentMode::Polling
    }
}

pub fn detect_deployment_mode() -> DeploymentMode {
    detect_deployment_mode_with(|key| env::var(key).ok())
}

#[cfg(feature = "lambda")]
pub async fn run_lambda_mode(state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    info!("☁️ AWS Lambda environment detected - setting up Lambda runtime");

    if let Ok(webhook_url) = env::var("WEBHOOK_URL") {
        info!("🔗 Setting up webhook at: {webhook_url}");
        state
            .bot
            .set_webhook(webhook_url.parse()?)
            .await
            .map_err(|e| format!("Failed to set webhook: {e}"))?;
    }

    info!("👂 Lambda handler ready for updates and scheduled jobs!");
    lambda_runtime::run(service_fn(move |event| {
        let state = state.clone();
        async move { lambda_handler(event, state).await }
    }))
    .await
    .map_err(|e| format!("Lambda runtime failed: {e}").into())
}

#[cfg(feature = "axum-server")]
pub async fn run_webhook_mode(state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::response::{Html, IntoResponse, Response};
    use axum::Json;

    use crate::jobs::{run_job, Job};
    use crate::notify::{relay, send_target, SEND_MISSING_FIELDS, SEND_USAGE};

    async fn health_check() -> Html<&'static str> {
        Html("<h1>CSE movers bot is running!</h1>")
    }

    async fn webhook_handler(
        State(state): State<AppState>,
        Json(update): Json<teloxide::types::Update>,
    ) -> &'static str {
        info!("🔗 Webhook received update: {:?}", update.id);

        if let teloxide::types::UpdateKind::Message(message) = update.kind {
            let _ = handle_message(state.bot.clone(), message, state.service.clone()).await;
        } else {
            info!("🔄 Received non-message update in webhook");
        }
        "OK"
    }

    async fn cron_handler(State(state): State<AppState>, Path(job): Path<String>) -> Response {
        let job: Job = match job.parse() {
            Ok(job) => job,
            Err(e) => return (StatusCode::NOT_FOUND, e.to_string()).into_response(),
        };

        match run_job(job, &state.service, &state.bot, &state.config).await {
            Ok(report) => Json(report).into_response(),
            Err(e) => {
                log::error!("❌ {job} job failed: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
        }
    }

    async fn movers_handler(State(state): State<AppState>) -> Response {
        let movers = state.service.movers().await;
        Json(serde_json::json!({
            "movers": movers,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        }))
        .into_response()
    }

    async fn news_handler(State(state): State<AppState>) -> Response {
        Json(state.service.news().await).into_response()
    }

    async fn send_usage() -> &'static str {
        SEND_USAGE
    }

    async fn send_handler(State(state): State<AppState>, Json(body): Json<serde_json::Value>) -> Response {
        let Some((chat_id, text)) = send_target(&body) else {
            return (StatusCode::BAD_REQUEST, SEND_MISSING_FIELDS).into_response();
        };

        match relay(&state.bot, &chat_id, &text).await {
            Ok(message) => Json(serde_json::json!({ "ok": true, "data": message })).into_response(),
            Err(e) => {
                log::error!("❌ Relay to chat {chat_id} failed: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
        }
    }

    let webhook_url = env::var("WEBHOOK_URL")
        .map_err(|_| "WEBHOOK_URL must be set for webhook mode")?;
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .map_err(|_| "PORT must be a valid number")?;

    info!("🌐 Production environment detected - running in WEBHOOK mode");
    info!("🔗 Setting up webhook at: {webhook_url}");

    state
        .bot
        .set_webhook(webhook_url.parse()?)
        .await
        .map_err(|e| format!("Failed to set webhook: {e}"))?;

    let app = Router::new()
        .route("/", get(health_check))
        .route("/webhook", post(webhook_handler))
        .route("/cron/:job", get(cron_handler))
        .route("/api/movers", get(movers_handler))
        .route("/api/news", get(news_handler))
        .route("/api/send", get(send_usage).post(send_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .map_err(|e| format!("Failed to bind to port: {e}"))?;

    info!("👂 Webhook server listening on port {port} - ready to receive updates!");

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("Server failed: {e}").into())
}

pub async fn run_polling_mode(state: AppState) {
    info!("🔄 Development environment detected - running in POLLING mode");
    info!("👂 Starting polling loop - ready to receive updates!");

    let handler = Update::filter_message().endpoint(handle_message);
    Dispatcher::builder(state.bot, handler)
        .dependencies(dptree::deps![state.service])
        .build()
        .dispatch()
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn mode_for(pairs: &[(&str, &str)]) -> DeploymentMode {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        detect_deployment_mode_with(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_detect_polling_by_default() {
        assert_eq!(mode_for(&[]), DeploymentMode::Polling);
    }

    #[test]
    fn test_detect_lambda() {
        assert_eq!(mode_for(&[("AWS_LAMBDA_FUNCTION_NAME", "cse-movers")]), DeploymentMode::Lambda);
        assert_eq!(mode_for(&[("LAMBDA_MODE", "true")]), DeploymentMode::Lambda);
    }

    #[test]
    fn test_detect_webhook() {
        assert_eq!(
            mode_for(&[("PORT", "8080"), ("WEBHOOK_URL", "https://x/webhook")]),
            DeploymentMode::Webhook
        );
        assert_eq!(mode_for(&[("PORT", "8080")]), DeploymentMode::Polling);
        assert_eq!(mode_for(&[("ENVIRONMENT", "production")]), DeploymentMode::Webhook);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(DeploymentMode::Webhook.to_string(), "WEBHOOK (Production)");
    }
}
