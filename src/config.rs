use std::env;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{FixedOffset, Local, Offset};

use crate::schedule::WorkdayWindow;
use crate::sync::DEFAULT_POLL_INTERVAL;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    /// Remote mirror endpoint; `None` runs offline.
    pub remote_url: Option<String>,
    pub poll_interval: Duration,
    pub metrics_port: Option<u16>,
    pub offset: FixedOffset,
    pub window: WorkdayWindow,
    /// Acting identity for management actions and default booker name.
    pub user: String,
}

fn var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

impl AppConfig {
    pub fn from_env() -> Self {
        let offset = var::<i32>("SLOTBOOK_UTC_OFFSET_MINUTES")
            .and_then(|m| FixedOffset::east_opt(m * 60))
            .unwrap_or_else(|| Local::now().offset().fix());

        let default_window = WorkdayWindow::default();
        let window = WorkdayWindow::new(
            var("SLOTBOOK_DAY_START_HOUR").unwrap_or(default_window.start_hour),
            var("SLOTBOOK_DAY_END_HOUR").unwrap_or(default_window.end_hour),
        )
        .unwrap_or_else(|| {
            tracing::warn!("invalid workday window in environment; using 08:00-18:00");
            default_window
        });

        Self {
            data_dir: env::var("SLOTBOOK_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            remote_url: env::var("SLOTBOOK_REMOTE_URL")
                .ok()
                .filter(|u| !u.trim().is_empty()),
            poll_interval: var::<u64>("SLOTBOOK_POLL_SECS")
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            metrics_port: var("SLOTBOOK_METRICS_PORT"),
            offset,
            window,
            user: env::var("SLOTBOOK_USER").unwrap_or_else(|_| "guest".to_string()),
        }
    }
}
