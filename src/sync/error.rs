/// Failure of one sync phase. Logged and reported, never rolls back local state.
#[derive(Debug)]
pub enum SyncError {
    /// Request never got a response.
    Transport(String),
    /// Endpoint answered with a non-success status.
    Status(u16),
    /// Response body wasn't a snapshot.
    Decode(String),
    /// Pulled snapshot couldn't be written locally.
    Storage(String),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Transport(e) => write!(f, "transport error: {e}"),
            SyncError::Status(code) => write!(f, "remote returned status {code}"),
            SyncError::Decode(e) => write!(f, "malformed snapshot: {e}"),
            SyncError::Storage(e) => write!(f, "local storage error: {e}"),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => SyncError::Status(status.as_u16()),
            None if e.is_decode() => SyncError::Decode(e.to_string()),
            None => SyncError::Transport(e.to_string()),
        }
    }
}
