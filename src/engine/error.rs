/// Rejected input. Raised before any state is touched; never logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MissingResource,
    MissingTime,
    InvalidDateTime,
    NotHourAligned,
    OutsideWorkday,
    EmptyBooker,
    BookerTooLong,
    EndNotAfterStart,
    StartInPast,
    OutOfRange,
    TooLong,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            ValidationError::MissingResource => "Please choose a resource.",
            ValidationError::MissingTime => "Please select both start and end times.",
            ValidationError::InvalidDateTime => "Dates are YYYY-MM-DD and times are HH:MM.",
            ValidationError::NotHourAligned => "Bookings start and end on the hour.",
            ValidationError::OutsideWorkday => "Bookings must fall within the workday.",
            ValidationError::EmptyBooker => "Please enter the booker's name.",
            ValidationError::BookerTooLong => "Booker name is too long.",
            ValidationError::EndNotAfterStart => "End time must be after start time.",
            ValidationError::StartInPast => "Bookings must start in the future.",
            ValidationError::OutOfRange => "Booking time is out of range.",
            ValidationError::TooLong => "Booking is too long.",
        };
        f.write_str(msg)
    }
}

#[derive(Debug)]
pub enum EngineError {
    Validation(ValidationError),
    /// Candidate overlaps the booking with this id.
    Conflict(String),
    NotFound(String),
    LimitExceeded(&'static str),
    Storage(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Validation(v) => write!(f, "{v}"),
            EngineError::Conflict(id) => {
                write!(f, "This time slot is already reserved (conflicts with {id}).")
            }
            EngineError::NotFound(id) => write!(f, "booking not found: {id}"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::Storage(e) => write!(f, "storage error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<ValidationError> for EngineError {
    fn from(v: ValidationError) -> Self {
        EngineError::Validation(v)
    }
}
