use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::model::Snapshot;

use super::RemoteMirror;

pub(crate) enum MirrorCommand {
    Push(Snapshot),
    Flush { response: oneshot::Sender<()> },
}

/// Background task that owns outbound pushes.
/// 1. Block until the first Push arrives.
/// 2. Drain every immediately available Push, keeping only the newest.
/// 3. Push that one snapshot; failures are logged inside `push_logged`.
/// 4. Answer any Flush seen during the drain.
async fn mirror_writer_loop(remote: Arc<dyn RemoteMirror>, mut rx: mpsc::UnboundedReceiver<MirrorCommand>) {
    while let Some(cmd) = rx.recv().await {
        match cmd {
            MirrorCommand::Push(snapshot) => {
                let mut latest = snapshot;
                let mut coalesced = 0usize;
                let mut waiters = Vec::new();

                loop {
                    match rx.try_recv() {
                        Ok(MirrorCommand::Push(newer)) => {
                            latest = newer;
                            coalesced += 1;
                        }
                        Ok(MirrorCommand::Flush { response }) => {
                            waiters.push(response);
                            break;
                        }
                        Err(_) => break, // channel empty; push what we have
                    }
                }

                if coalesced > 0 {
                    debug!(coalesced, "coalesced queued pushes");
                }
                let _ = super::push_logged(remote.as_ref(), &latest).await;
                for tx in waiters {
                    let _ = tx.send(());
                }
            }
            MirrorCommand::Flush { response } => {
                let _ = response.send(());
            }
        }
    }
}

/// Queue side of the mirror writer. Cheap to clone.
#[derive(Clone)]
pub struct MirrorHandle {
    tx: mpsc::UnboundedSender<MirrorCommand>,
}

impl MirrorHandle {
    /// Spawn the writer task. Must be called inside a tokio runtime.
    pub fn spawn(remote: Arc<dyn RemoteMirror>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(mirror_writer_loop(remote, rx));
        Self { tx }
    }

    /// Fire-and-forget push of `snapshot`.
    pub fn enqueue(&self, snapshot: Snapshot) {
        if self.tx.send(MirrorCommand::Push(snapshot)).is_err() {
            tracing::warn!("mirror writer shut down; push dropped");
        }
    }

    /// Wait until everything queued before this call has been attempted.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.tx.send(MirrorCommand::Flush { response: tx }).is_ok() {
            let _ = rx.await;
        }
    }
}
