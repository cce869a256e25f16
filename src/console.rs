//! Console front end: executes parsed commands against the engine and
//! renders plain-text views.

use std::fmt::Write;
use std::sync::Arc;

use chrono::{Days, NaiveDate, NaiveTime, Timelike};

use crate::catalog::{self, ResourceGroup};
use crate::command::{Command, HELP};
use crate::config::AppConfig;
use crate::engine::{Engine, EngineError, ResourceStatus, SlotOutcome, ValidationError};
use crate::limits::RECENT_ACTIVITY_LIMIT;
use crate::model::*;
use crate::schedule::{DaySchedule, day_of, day_start_ms, format_time, format_timestamp, parse_booking_form};
use crate::sync::SyncController;

/// What the binary should do after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Quit,
}

pub struct Console {
    engine: Arc<Engine>,
    sync: Option<Arc<SyncController>>,
    config: AppConfig,
    day: NaiveDate,
}

impl Console {
    pub fn new(engine: Arc<Engine>, sync: Option<Arc<SyncController>>, config: AppConfig) -> Self {
        let day = day_of(engine.now(), config.offset).unwrap_or(NaiveDate::MIN);
        Self {
            engine,
            sync,
            config,
            day,
        }
    }

    /// Day currently shown by `schedule`.
    pub fn day(&self) -> NaiveDate {
        self.day
    }

    pub async fn execute(&mut self, cmd: Command) -> Reply {
        let text = match cmd {
            Command::Book {
                resource_id,
                date,
                start,
                end,
                booker_id,
            } => {
                let booker = booker_id.unwrap_or_else(|| self.config.user.clone());
                self.book(&resource_id, &date, &start, &end, &booker).await
            }
            Command::Cancel { id, slot } => self.cancel(&id, slot).await,
            Command::Remove { id } => match self.engine.remove_booking(&id, &self.config.user).await {
                Ok(b) => format!("Removed {} ({}).", b.id, describe(&b, self.config.offset)),
                Err(e) => e.to_string(),
            },
            Command::Schedule { date } => {
                if let Some(date) = date {
                    self.day = date;
                }
                self.render_schedule().await
            }
            Command::NextDay => {
                self.day = self.day.checked_add_days(Days::new(1)).unwrap_or(self.day);
                self.render_schedule().await
            }
            Command::PrevDay => {
                self.day = self.day.checked_sub_days(Days::new(1)).unwrap_or(self.day);
                self.render_schedule().await
            }
            Command::Today => {
                self.day = day_of(self.engine.now(), self.config.offset).unwrap_or(self.day);
                self.render_schedule().await
            }
            Command::Dashboard => self.render_dashboard().await,
            Command::Logs { limit } => {
                let logs = match limit {
                    Some(n) => self.engine.recent_activity(n).await,
                    None => self.engine.logs().await,
                };
                render_logs(&logs, self.config.offset)
            }
            Command::Sync => match &self.sync {
                Some(sync) => sync.sync_now().await.message().to_string(),
                None => "No remote configured; working offline.".to_string(),
            },
            Command::Help => HELP.to_string(),
            Command::Quit => return Reply::Quit,
        };
        Reply::Text(text)
    }

    async fn book(&self, resource_id: &str, date: &str, start: &str, end: &str, booker: &str) -> String {
        let req = match parse_booking_form(
            resource_id,
            date,
            start,
            end,
            booker,
            self.config.window,
            self.config.offset,
        ) {
            Ok(req) => req,
            Err(e) => return e.to_string(),
        };
        match self.engine.create_booking(req).await {
            Ok(b) => format!("Booked {} ({}).", b.id, describe(&b, self.config.offset)),
            Err(e) => e.to_string(),
        }
    }

    async fn cancel(&self, id: &str, slot: Option<(NaiveTime, NaiveTime)>) -> String {
        let Some(booking) = self.engine.get_booking(id).await else {
            return EngineError::NotFound(id.to_string()).to_string();
        };
        let span = match slot {
            None => booking.span(),
            Some((start, end)) => {
                let Some(day) = day_of(booking.start_time, self.config.offset) else {
                    return ValidationError::OutOfRange.to_string();
                };
                let midnight = day_start_ms(day, self.config.offset);
                let start = midnight + time_of_day_ms(start, false);
                let end = midnight + time_of_day_ms(end, true);
                match Span::try_new(start, end) {
                    Some(span) => span,
                    None => return ValidationError::EndNotAfterStart.to_string(),
                }
            }
        };

        let offset = self.config.offset;
        match self.engine.cancel_slot(id, span).await {
            Ok(SlotOutcome::Deleted(b)) => format!("Cancelled {} ({}).", b.id, describe(&b, offset)),
            Ok(SlotOutcome::TrimmedStart(b) | SlotOutcome::TrimmedEnd(b)) => {
                format!("Trimmed {} to {}.", b.id, describe(&b, offset))
            }
            Ok(SlotOutcome::Split { head, tail }) => format!(
                "Split into {} ({}) and {} ({}).",
                head.id,
                describe(&head, offset),
                tail.id,
                describe(&tail, offset)
            ),
            Ok(SlotOutcome::Untouched) => "That slot is not part of the booking; nothing changed.".to_string(),
            Err(e) => e.to_string(),
        }
    }

    pub async fn render_schedule(&self) -> String {
        let schedule = self.engine.day_schedule(self.day, self.config.window).await;
        render_schedule(&schedule)
    }

    pub async fn render_dashboard(&self) -> String {
        let offset = self.config.offset;
        let statuses = self.engine.dashboard().await;
        let mut out = String::new();
        for group in ResourceGroup::ALL {
            let _ = writeln!(out, "{group}:");
            for resource in catalog::by_group(group) {
                let Some((_, status)) = statuses.iter().find(|(r, _)| r.id == resource.id) else {
                    continue;
                };
                let line = match status {
                    ResourceStatus::Occupied { until } => format!("occupied until {}", format_time(*until, offset)),
                    ResourceStatus::Available { next: Some(next) } => {
                        format!("available (next booking {})", format_timestamp(*next, offset))
                    }
                    ResourceStatus::Available { next: None } => "available".to_string(),
                };
                let _ = writeln!(out, "  {:<12} {:<26} {line}", resource.id, resource.name);
            }
        }
        out.push_str("\nRecent activity:\n");
        let recent = self.engine.recent_activity(RECENT_ACTIVITY_LIMIT).await;
        out.push_str(&render_logs(&recent, offset));
        out
    }
}

/// Milliseconds since local midnight. `00:00` as an end means end of day.
fn time_of_day_ms(t: NaiveTime, is_end: bool) -> Ms {
    let secs = t.num_seconds_from_midnight() as Ms;
    if is_end && secs == 0 { 24 * HOUR_MS } else { secs * 1000 }
}

/// Resource id with its catalog name; bare id for resources the catalog
/// doesn't know (e.g. pulled from the mirror).
fn resource_label(resource_id: &str) -> String {
    match catalog::lookup(resource_id) {
        Some(r) => format!("{} {}", r.id, r.name),
        None => resource_id.to_string(),
    }
}

fn describe(b: &Booking, offset: chrono::FixedOffset) -> String {
    format!(
        "{} {} - {}, {}",
        resource_label(&b.resource_id),
        format_timestamp(b.start_time, offset),
        format_time(b.end_time, offset),
        b.booker_id
    )
}

pub fn render_schedule(schedule: &DaySchedule) -> String {
    let mut out = format!("{}\n", schedule.day.format("%A, %B %-d, %Y"));
    let Some(first) = schedule.rows.first() else {
        return out;
    };

    let _ = write!(out, "{:<12}", "");
    for slot in &first.slots {
        let _ = write!(out, " {:02}:00  ", slot.hour);
    }
    out.push('\n');

    for row in &schedule.rows {
        let _ = write!(out, "{:<12}", row.resource.id);
        for slot in &row.slots {
            let cell = match &slot.booking {
                Some(b) => b.booker_id.chars().take(7).collect::<String>(),
                None => ".".to_string(),
            };
            let _ = write!(out, " {cell:<7}");
        }
        out.push('\n');
    }
    out
}

pub fn render_logs(logs: &[LogEntry], offset: chrono::FixedOffset) -> String {
    if logs.is_empty() {
        return "No activity yet.\n".to_string();
    }
    let mut out = String::new();
    for entry in logs {
        let _ = writeln!(
            out,
            "{}  {:<24} {:<10} {}",
            format_timestamp(entry.timestamp, offset),
            entry.activity_type,
            entry.user_id,
            entry.details
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;
    use crate::clock::ManualClock;
    use crate::command::parse_command;
    use crate::notify::NotifyHub;
    use crate::schedule::WorkdayWindow;
    use crate::store::MemoryStore;

    // 2026-10-20T07:00:00Z
    const NOW: Ms = 1_792_454_400_000 + 7 * HOUR_MS;

    fn console() -> Console {
        let offset = FixedOffset::east_opt(0).unwrap();
        let engine = Arc::new(
            Engine::open(
                Arc::new(MemoryStore::new()),
                Arc::new(ManualClock::new(NOW)),
                offset,
                Arc::new(NotifyHub::new()),
            )
            .unwrap(),
        );
        let config = AppConfig {
            data_dir: std::env::temp_dir(),
            remote_url: None,
            poll_interval: crate::sync::DEFAULT_POLL_INTERVAL,
            metrics_port: None,
            offset,
            window: WorkdayWindow::default(),
            user: "frontdesk".into(),
        };
        Console::new(engine, None, config)
    }

    async fn run(c: &mut Console, line: &str) -> String {
        match c.execute(parse_command(line).unwrap()).await {
            Reply::Text(t) => t,
            Reply::Quit => panic!("unexpected quit for {line}"),
        }
    }

    #[tokio::test]
    async fn book_then_split_via_console() {
        let mut c = console();
        let out = run(&mut c, "book PC-1 2026-10-20 09:00 12:00 dana").await;
        assert!(out.starts_with("Booked book-"), "{out}");
        assert!(out.contains("PC-1 URANUS NM CLIENT Oct 20, 09:00 AM"), "{out}");

        let id = c.engine.bookings().await[0].id.clone();
        let out = run(&mut c, &format!("cancel {id} 10:00 11:00")).await;
        assert!(out.starts_with("Split into"), "{out}");
        assert_eq!(c.engine.bookings().await.len(), 2);
    }

    #[tokio::test]
    async fn book_defaults_to_configured_user() {
        let mut c = console();
        run(&mut c, "book Laptop-5 2026-10-20 13:00 14:00").await;
        assert_eq!(c.engine.bookings().await[0].booker_id, "frontdesk");
    }

    #[tokio::test]
    async fn form_and_engine_errors_are_shown() {
        let mut c = console();
        let out = run(&mut c, "book PC-1 2026-10-20 09:30 11:00 dana").await;
        assert_eq!(out, ValidationError::NotHourAligned.to_string());

        run(&mut c, "book PC-1 2026-10-20 09:00 11:00 dana").await;
        let out = run(&mut c, "book PC-1 2026-10-20 10:00 12:00 eli").await;
        assert!(out.starts_with("This time slot is already reserved"), "{out}");

        let out = run(&mut c, "cancel book-missing").await;
        assert!(out.contains("not found"), "{out}");
    }

    #[tokio::test]
    async fn whole_cancel_and_remove() {
        let mut c = console();
        run(&mut c, "book PC-2 2026-10-20 09:00 10:00 dana").await;
        run(&mut c, "book PC-3 2026-10-20 09:00 10:00 dana").await;
        let ids: Vec<String> = c.engine.bookings().await.into_iter().map(|b| b.id).collect();

        assert!(run(&mut c, &format!("cancel {}", ids[0])).await.starts_with("Cancelled"));
        assert!(run(&mut c, &format!("remove {}", ids[1])).await.starts_with("Removed"));
        assert!(c.engine.bookings().await.is_empty());

        let logs = c.engine.logs().await;
        assert_eq!(logs[0].activity_type, ActivityType::BookingRemoved);
        assert_eq!(logs[0].user_id, "frontdesk");
    }

    #[test]
    fn unknown_resource_is_labelled_by_id() {
        assert_eq!(resource_label("Laptop-5"), "Laptop-5 FG Laptop 5");
        assert_eq!(resource_label("Projector-9"), "Projector-9");
    }

    #[tokio::test]
    async fn day_navigation() {
        let mut c = console();
        let today = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        assert_eq!(c.day(), today);

        let out = run(&mut c, "next").await;
        assert!(out.starts_with("Wednesday, October 21, 2026"), "{out}");
        run(&mut c, "prev").await;
        run(&mut c, "prev").await;
        assert_eq!(c.day(), NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        run(&mut c, "today").await;
        assert_eq!(c.day(), today);
    }

    #[tokio::test]
    async fn schedule_grid_shows_booker() {
        let mut c = console();
        run(&mut c, "book MCH-Mobile 2026-10-20 08:00 09:00 zed").await;
        let out = run(&mut c, "schedule 2026-10-20").await;
        let row = out.lines().find(|l| l.starts_with("MCH-Mobile")).unwrap();
        assert!(row.contains("zed"), "{row}");
        let row = out.lines().find(|l| l.starts_with("PC-1")).unwrap();
        assert!(!row.contains("zed"));
    }

    #[tokio::test]
    async fn dashboard_and_offline_sync() {
        let mut c = console();
        run(&mut c, "book PC-1 2026-10-20 09:00 10:00 dana").await;
        let out = run(&mut c, "dashboard").await;
        let line = out.lines().find(|l| l.trim_start().starts_with("PC-1 ")).unwrap();
        assert!(line.contains("URANUS NM CLIENT"), "{line}");
        assert!(line.contains("available (next booking Oct 20, 09:00 AM)"), "{line}");
        let headings: Vec<&str> = out.lines().filter(|l| l.ends_with(':') && !l.starts_with(' ')).collect();
        assert_eq!(headings, vec!["PC:", "Laptop:", "Mobile:", "Recent activity:"]);
        assert!(out.contains("New Booking"));

        assert!(run(&mut c, "sync").await.contains("offline"));
        assert_eq!(c.execute(Command::Quit).await, Reply::Quit);
    }
}
