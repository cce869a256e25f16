use async_trait::async_trait;

use crate::model::Snapshot;

use super::SyncError;
use super::wire::decode_snapshot;

/// Remote whole-snapshot replica. Best effort: callers log failures and carry on.
#[async_trait]
pub trait RemoteMirror: Send + Sync {
    async fn push(&self, snapshot: &Snapshot) -> Result<(), SyncError>;
    async fn pull(&self) -> Result<Snapshot, SyncError>;
}

/// `POST <endpoint>` to push, `GET <endpoint>` to pull.
pub struct HttpRemote {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpRemote {
    pub fn new(endpoint: String) -> Self {
        Self {
            endpoint,
            client: reqwest::Client::new(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RemoteMirror for HttpRemote {
    async fn push(&self, snapshot: &Snapshot) -> Result<(), SyncError> {
        self.client
            .post(&self.endpoint)
            .json(snapshot)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn pull(&self) -> Result<Snapshot, SyncError> {
        let body = self
            .client
            .get(&self.endpoint)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(decode_snapshot(&body)?.snapshot)
    }
}
