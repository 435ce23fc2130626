use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use log::info;
use serde::Serialize;
use teloxide::prelude::*;

use crate::config::BotConfig;
use crate::format::{format_daytrade, format_low_float, format_swing};
use crate::market::{MarketDataError, MoverService};
use crate::notify::{broadcast, DeliveryError};

/// Scheduled broadcasts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Job {
    /// Ranked day-trade movers
    Daytrade,
    /// Low-float, high-volume movers with related headlines
    LowFloat,
    /// Watchlist headlines
    Swing,
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Job::Daytrade => write!(f, "daytrade"),
            Job::LowFloat => write!(f, "lowfloat"),
            Job::Swing => write!(f, "swing"),
        }
    }
}

impl FromStr for Job {
    type Err = JobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daytrade" | "day-trade" => Ok(Job::Daytrade),
            "lowfloat" | "low-float" | "cse-telegram" => Ok(Job::LowFloat),
            "swing" => Ok(Job::Swing),
            other => Err(JobError::UnknownJob(other.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Unknown job: {0}")]
    UnknownJob(String),

    #[error(transparent)]
    Config(#[from] MarketDataError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}

/// Outcome of a broadcast run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobReport {
    pub ok: bool,
    pub job: Job,
    pub sent: usize,
    pub items: usize,
    pub ts: String,
}

/// Build the message text for a job and the number of entries it lists
pub async fn compose(job: Job, service: &MoverService) -> (String, usize) {
    let now = Utc::now();
    match job {
        Job::Daytrade => {
            let report = service.daytrade().await;
            (format_daytrade(&report, now), report.ranking.picks.len())
        }
        Job::LowFloat => {
            let report = service.low_float().await;
            (format_low_float(&report, now), report.picks.len())
        }
        Job::Swing => {
            let picks = service.swing().await;
            (format_swing(&picks, now), picks.len())
        }
    }
}

/// Compose a job's message and send it to every configured chat
pub async fn run_job(job: Job, service: &MoverService, bot: &Bot, config: &BotConfig) -> Result<JobReport, JobError> {
    let chat_ids = config.require_chat_ids()?;
    info!("⏰ Running {job} job for {} chats", chat_ids.len());

    let (text, items) = compose(job, service).await;
    let sent = broadcast(bot, chat_ids, &text).await?;

    info!("✅ {job} job finished: {items} items sent to {sent} chats");
    Ok(JobReport {
        ok: true,
        job,
        sent,
        items,
        ts: Utc::now().to_rfc3339(),
    })
}
