use chrono::{NaiveDate, NaiveTime};

/// Parsed console command.
#[derive(Debug, PartialEq)]
pub enum Command {
    /// Fields are passed through raw; form validation happens downstream.
    Book {
        resource_id: String,
        date: String,
        start: String,
        end: String,
        booker_id: Option<String>,
    },
    /// Cancel `[start, end)` on the booking's own day, or the whole booking.
    Cancel {
        id: String,
        slot: Option<(NaiveTime, NaiveTime)>,
    },
    Remove {
        id: String,
    },
    Schedule {
        date: Option<NaiveDate>,
    },
    NextDay,
    PrevDay,
    Today,
    Dashboard,
    Logs {
        limit: Option<usize>,
    },
    Sync,
    Help,
    Quit,
}

#[derive(Debug, PartialEq)]
pub enum CommandError {
    Empty,
    Unknown(String),
    WrongArity(&'static str, usize, usize),
    BadDate(String),
    BadTime(String),
    BadNumber(String),
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Empty => write!(f, "empty command"),
            CommandError::Unknown(s) => write!(f, "unknown command: {s} (try `help`)"),
            CommandError::WrongArity(cmd, expected, got) => {
                write!(f, "{cmd}: expected at least {expected} arguments, got {got}")
            }
            CommandError::BadDate(s) => write!(f, "bad date (want YYYY-MM-DD): {s}"),
            CommandError::BadTime(s) => write!(f, "bad time (want HH:MM): {s}"),
            CommandError::BadNumber(s) => write!(f, "bad number: {s}"),
        }
    }
}

impl std::error::Error for CommandError {}

pub const HELP: &str = "\
book <resource> <YYYY-MM-DD> <HH:MM> <HH:MM> [booker]   reserve a time range
cancel <booking-id> [<HH:MM> <HH:MM>]                   cancel a slot (or the whole booking)
remove <booking-id>                                     delete a booking outright
schedule [YYYY-MM-DD] | next | prev | today             show the day grid
dashboard                                               resource status
logs [n]                                                activity log, newest first
sync                                                    push then pull now
quit";

fn parse_date(raw: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| CommandError::BadDate(raw.to_string()))
}

fn parse_time(raw: &str) -> Result<NaiveTime, CommandError> {
    NaiveTime::parse_from_str(raw, "%H:%M").map_err(|_| CommandError::BadTime(raw.to_string()))
}

pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&verb, args)) = words.split_first() else {
        return Err(CommandError::Empty);
    };

    match verb.to_ascii_lowercase().as_str() {
        "book" => {
            if args.len() < 4 {
                return Err(CommandError::WrongArity("book", 4, args.len()));
            }
            let booker_id = (args.len() > 4).then(|| args[4..].join(" "));
            Ok(Command::Book {
                resource_id: args[0].to_string(),
                date: args[1].to_string(),
                start: args[2].to_string(),
                end: args[3].to_string(),
                booker_id,
            })
        }
        "cancel" => match args {
            [id] => Ok(Command::Cancel {
                id: id.to_string(),
                slot: None,
            }),
            [id, start, end] => Ok(Command::Cancel {
                id: id.to_string(),
                slot: Some((parse_time(start)?, parse_time(end)?)),
            }),
            _ => Err(CommandError::WrongArity("cancel", 1, args.len())),
        },
        "remove" | "rm" => match args {
            [id] => Ok(Command::Remove { id: id.to_string() }),
            _ => Err(CommandError::WrongArity("remove", 1, args.len())),
        },
        "schedule" => Ok(Command::Schedule {
            date: args.first().map(|d| parse_date(d)).transpose()?,
        }),
        "next" => Ok(Command::NextDay),
        "prev" => Ok(Command::PrevDay),
        "today" => Ok(Command::Today),
        "dashboard" => Ok(Command::Dashboard),
        "logs" => Ok(Command::Logs {
            limit: args
                .first()
                .map(|n| n.parse::<usize>().map_err(|_| CommandError::BadNumber(n.to_string())))
                .transpose()?,
        }),
        "sync" => Ok(Command::Sync),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_book_with_multiword_booker() {
        let cmd = parse_command("book PC-1 2026-10-20 09:00 11:00 Jane Doe").unwrap();
        match cmd {
            Command::Book { resource_id, date, start, end, booker_id } => {
                assert_eq!(resource_id, "PC-1");
                assert_eq!(date, "2026-10-20");
                assert_eq!(start, "09:00");
                assert_eq!(end, "11:00");
                assert_eq!(booker_id.as_deref(), Some("Jane Doe"));
            }
            _ => panic!("expected Book, got {cmd:?}"),
        }
    }

    #[test]
    fn parse_book_without_booker() {
        let cmd = parse_command("BOOK Laptop-2 2026-10-20 13:00 14:00").unwrap();
        assert!(matches!(cmd, Command::Book { booker_id: None, .. }));
    }

    #[test]
    fn parse_book_arity() {
        assert_eq!(
            parse_command("book PC-1 2026-10-20 09:00"),
            Err(CommandError::WrongArity("book", 4, 3))
        );
    }

    #[test]
    fn parse_cancel_forms() {
        assert_eq!(
            parse_command("cancel book-1").unwrap(),
            Command::Cancel { id: "book-1".into(), slot: None }
        );
        let cmd = parse_command("cancel book-1 10:00 11:00").unwrap();
        let Command::Cancel { slot: Some((s, e)), .. } = cmd else {
            panic!("expected slot cancel");
        };
        assert_eq!(s, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert_eq!(e, NaiveTime::from_hms_opt(11, 0, 0).unwrap());

        assert_eq!(
            parse_command("cancel book-1 10:00"),
            Err(CommandError::WrongArity("cancel", 1, 2))
        );
        assert_eq!(
            parse_command("cancel book-1 ten 11:00"),
            Err(CommandError::BadTime("ten".into()))
        );
    }

    #[test]
    fn parse_schedule_and_navigation() {
        assert_eq!(parse_command("schedule").unwrap(), Command::Schedule { date: None });
        assert_eq!(
            parse_command("schedule 2026-10-21").unwrap(),
            Command::Schedule { date: NaiveDate::from_ymd_opt(2026, 10, 21) }
        );
        assert_eq!(
            parse_command("schedule tomorrow"),
            Err(CommandError::BadDate("tomorrow".into()))
        );
        assert_eq!(parse_command("next").unwrap(), Command::NextDay);
        assert_eq!(parse_command("prev").unwrap(), Command::PrevDay);
    }

    #[test]
    fn parse_logs_limit() {
        assert_eq!(parse_command("logs").unwrap(), Command::Logs { limit: None });
        assert_eq!(parse_command("logs 5").unwrap(), Command::Logs { limit: Some(5) });
        assert_eq!(parse_command("logs many"), Err(CommandError::BadNumber("many".into())));
    }

    #[test]
    fn parse_empty_and_unknown() {
        assert_eq!(parse_command("   "), Err(CommandError::Empty));
        assert_eq!(parse_command("frobnicate"), Err(CommandError::Unknown("frobnicate".into())));
    }
}
