use chrono::{DateTime, Utc};
use chrono_tz::Asia::Colombo;
use chrono_tz::Tz;

use crate::market::{DaytradeReport, LowFloatReport, MoverRecord, ScoredMover};
use crate::news::NewsItem;

fn colombo(time: DateTime<Utc>) -> DateTime<Tz> {
    time.with_timezone(&Colombo)
}

/// 1234567 -> "1,234,567"
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn mover_tags(record: &MoverRecord) -> Vec<String> {
    let mut tags = vec![format!("{:+.1}%", record.pct)];
    if let Some(volume) = record.volume.filter(|v| *v > 0) {
        tags.push(format!("Vol {}", group_thousands(volume)));
    }
    if let Some(turnover) = record.turnover.filter(|t| *t > 0.0) {
        tags.push(format!("TO LKR {}", group_thousands(turnover.round() as u64)));
    }
    if record.is_low_float() {
        tags.push("Low float".to_string());
    }
    tags
}

fn scored_line(index: usize, mover: &ScoredMover) -> String {
    let mut tags = mover_tags(&mover.record);
    if mover.has_news {
        tags.push("News".to_string());
    }
    tags.push(format!("Score {:.0}/100", mover.trade_score * 100.0));
    format!("{}. {} | {}", index + 1, mover.record.symbol, tags.join(" · "))
}

/// Day-trade broadcast text
pub fn format_daytrade(report: &DaytradeReport, now: DateTime<Utc>) -> String {
    let header = format!(
        "CSE Day-Trade Movers - {} (Asia/Colombo)\n(Ranked by price + volume + liquidity, bonuses for low float & news; with guaranteed fallback)",
        colombo(now).format("%a, %b %-d, %H:%M")
    );

    let lines: Vec<String> = report
        .ranking
        .picks
        .iter()
        .enumerate()
        .map(|(i, m)| scored_line(i, m))
        .collect();

    let body = if lines.is_empty() {
        "No data - rechecking shortly.".to_string()
    } else {
        lines.join("\n\n")
    };
    let note = if report.seeded {
        "\n\nNo live movers yet, showing the watchlist."
    } else {
        ""
    };
    format!("{header}\n\n{body}{note}")
}

/// Low-float broadcast text, each mover followed by its first headline
pub fn format_low_float(report: &LowFloatReport, now: DateTime<Utc>) -> String {
    let header = format!(
        "CSE Low-Float High-Volume Movers - {}",
        colombo(now).format("%a, %b %-d %H:%M")
    );

    let lines: Vec<String> = report
        .picks
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let tag = mover_tags(&MoverRecord { turnover: None, ..m.clone() }).join(" · ");
            let related = report
                .news
                .iter()
                .find(|n| n.ticker.as_deref() == Some(m.symbol.as_str()))
                .map(|n| format!("\n{} - {}{}", n.title, n.source, url_line(n)))
                .unwrap_or_default();
            format!("{}. {} | {tag}{related}", i + 1, m.symbol)
        })
        .collect();

    let body = if lines.is_empty() {
        "No qualifying low-float high-volume movers yet. Rechecking soon.".to_string()
    } else {
        lines.join("\n\n")
    };
    format!("{header}\n\n{body}")
}

/// Swing watch broadcast text
pub fn format_swing(picks: &[NewsItem], now: DateTime<Utc>) -> String {
    let header = format!("CSE Swing Watch - {} (Asia/Colombo)", colombo(now).format("%a, %b %-d, %H:%M"));

    let body = if picks.is_empty() {
        "No fresh headlines for your swing watchlist yet.".to_string()
    } else {
        picks
            .iter()
            .enumerate()
            .map(|(i, n)| headline_line(i, n))
            .collect::<Vec<_>>()
            .join("\n\n")
    };
    format!("{header}\n\n{body}")
}

/// Reply for `/news`
pub fn format_news(symbol: Option<&str>, items: &[NewsItem]) -> String {
    let title = match symbol {
        Some(symbol) => format!("📰 {} News", symbol.to_uppercase()),
        None => "📰 CSE News".to_string(),
    };

    if items.is_empty() {
        return format!("{title}\n\nNo recent headlines found.");
    }

    let lines: Vec<String> = items.iter().enumerate().map(|(i, n)| headline_line(i, n)).collect();
    format!("{title}\n\n{}", lines.join("\n\n"))
}

fn headline_line(index: usize, item: &NewsItem) -> String {
    let ticker = item.ticker.as_deref().map(|t| format!(" {t}")).unwrap_or_default();
    format!(
        "{}. {}{ticker}\n{} · {}{}",
        index + 1,
        item.title,
        colombo(item.date).format("%b %-d, %H:%M"),
        item.source,
        url_line(item)
    )
}

fn url_line(item: &NewsItem) -> String {
    item.url.as_deref().map(|u| format!("\n{u}")).unwrap_or_default()
}
