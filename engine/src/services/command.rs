// Line-oriented operator commands for the headless binary.
use crate::error::EngineError;
use crate::services::dashboard::DashboardSnapshot;
use crate::services::runtime::DashboardHandle;
use shared::models::CooldownCategory;
use shared::utils::{format_countdown, format_price};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Request(CooldownCategory),
    SelectPair(String),
    Play,
    Pause,
    TogglePlay,
    ToggleWaiting,
    Indicators,
    Status,
    Quit,
}

impl FromStr for Command {
    type Err = EngineError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let command = match (word.to_ascii_lowercase().as_str(), rest) {
            ("play", "") => Command::Play,
            ("pause", "") => Command::Pause,
            ("toggle", "") => Command::TogglePlay,
            ("wait", "") => Command::ToggleWaiting,
            ("status", "") => Command::Status,
            ("indicators", "") => Command::Indicators,
            ("quit" | "exit", "") => Command::Quit,
            ("pair", symbol) if !symbol.is_empty() => Command::SelectPair(symbol.to_string()),
            ("signal", category) => Command::Request(
                CooldownCategory::from_str(category).map_err(|_| EngineError::UnknownCommand(line.to_string()))?,
            ),
            (_, "") => CooldownCategory::from_str(word)
                .map(Command::Request)
                .map_err(|_| EngineError::UnknownCommand(line.to_string()))?,
            _ => return Err(EngineError::UnknownCommand(line.to_string())),
        };
        Ok(command)
    }
}

/// Applies one command and returns the line to show the operator.
pub async fn apply(handle: &DashboardHandle, command: Command) -> Result<String, EngineError> {
    let reply = match command {
        Command::Request(category) => {
            if handle.request_signal(category).await {
                let snapshot = handle.snapshot().await;
                match snapshot.signal {
                    Some(signal) => format!(
                        "{} signal: {} {} {} @ {}",
                        category,
                        signal.pair,
                        signal.direction,
                        signal.expiration,
                        format_price(signal.entry_price)
                    ),
                    None => format!("{} signal requested", category),
                }
            } else {
                let snapshot = handle.snapshot().await;
                let left = snapshot.cooldowns[category.index()].time_left_seconds;
                format!("{} cooling down: {}", category, format_countdown(left))
            }
        }
        Command::SelectPair(symbol) => {
            handle.select_instrument(&symbol).await?;
            format!("instrument {} seeded", symbol)
        }
        Command::Play => {
            handle.set_playing(true).await;
            "playing".to_string()
        }
        Command::Pause => {
            handle.set_playing(false).await;
            "paused".to_string()
        }
        Command::TogglePlay => {
            if handle.toggle_playing().await {
                "playing".to_string()
            } else {
                "paused".to_string()
            }
        }
        Command::ToggleWaiting => {
            let waiting = handle.toggle_waiting().await;
            let count = handle.snapshot().await.waiting_users;
            format!("waiting: {} ({} users)", waiting, count)
        }
        Command::Indicators => handle
            .indicator_lines()
            .await?
            .iter()
            .map(|line| match line.values.last() {
                Some(value) => format!("{}={:.5}", line.name, value),
                None => format!("{}=-", line.name),
            })
            .collect::<Vec<_>>()
            .join(" | "),
        Command::Status => status_line(&handle.snapshot().await),
        Command::Quit => "bye".to_string(),
    };
    Ok(reply)
}

pub fn status_line(snapshot: &DashboardSnapshot) -> String {
    let price = snapshot
        .market
        .current_price()
        .map(format_price)
        .unwrap_or_else(|| "-".to_string());
    let cooldowns = snapshot
        .cooldowns
        .iter()
        .map(|c| {
            if c.can_use {
                format!("{}=ready", c.category)
            } else {
                format!("{}={}", c.category, format_countdown(c.time_left_seconds))
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!(
        "{} {} {} | {} | next signal in {} ({:.0}%, {:?}) | {} waiting",
        snapshot.market.symbol.as_deref().unwrap_or("-"),
        price,
        if snapshot.market.playing { "playing" } else { "paused" },
        cooldowns,
        format_countdown(snapshot.schedule.time_left_seconds),
        snapshot.schedule.progress_percent,
        snapshot.schedule.stage,
        snapshot.waiting_users,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::EngineSettings;
    use crate::services::dashboard::Dashboard;
    use crate::services::runtime::{Clock, TokioClock};
    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::Arc;

    #[test]
    fn parses_category_shortcuts() {
        assert_eq!("express".parse::<Command>().unwrap(), Command::Request(CooldownCategory::Express));
        assert_eq!("1h".parse::<Command>().unwrap(), Command::Request(CooldownCategory::Hourly));
        assert_eq!(
            "signal 24h".parse::<Command>().unwrap(),
            Command::Request(CooldownCategory::TwentyFourHour)
        );
        assert_eq!(" Pause ".parse::<Command>().unwrap(), Command::Pause);
        assert_eq!(
            "pair GBP/JPY-OTC".parse::<Command>().unwrap(),
            Command::SelectPair("GBP/JPY-OTC".to_string())
        );
    }

    #[test]
    fn rejects_unknown_input() {
        for line in ["", "dance", "pair", "signal weekly", "pause now"] {
            assert!(matches!(line.parse::<Command>(), Err(EngineError::UnknownCommand(_))), "{line:?}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn request_reports_cooldown_on_repeat() {
        let clock = Arc::new(TokioClock::starting_at(Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()));
        let mut dashboard = Dashboard::new(&EngineSettings::default(), Box::new(StdRng::seed_from_u64(3))).unwrap();
        dashboard.select_instrument("EUR/USD", clock.now()).unwrap();
        let handle = DashboardHandle::spawn(dashboard, clock);

        let first = apply(&handle, Command::Request(CooldownCategory::Hourly)).await.unwrap();
        assert!(first.starts_with("hourly signal: "), "{first}");
        let second = apply(&handle, Command::Request(CooldownCategory::Hourly)).await.unwrap();
        assert_eq!(second, "hourly cooling down: 01:00:00");

        assert!(apply(&handle, Command::SelectPair("  ".to_string())).await.is_err());
        assert_eq!(apply(&handle, Command::Pause).await.unwrap(), "paused");
        assert!(apply(&handle, Command::Status).await.unwrap().contains("paused"));

        let lines = apply(&handle, "indicators".parse().unwrap()).await.unwrap();
        let rsi = handle.snapshot().await.market.indicators.last().map(|s| s.rsi).unwrap();
        assert!(lines.contains(&format!("RSI(14)={:.5}", rsi)), "{lines}");
        assert!(lines.contains("BB(20,2) upper="));
        assert!(lines.contains("MACD(12,26,9) signal="));
        handle.shutdown().await;
    }
}
