use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use slotbook::clock::SystemClock;
use slotbook::command::parse_command;
use slotbook::config::AppConfig;
use slotbook::console::{Console, Reply};
use slotbook::engine::Engine;
use slotbook::notify::NotifyHub;
use slotbook::store::FileStore;
use slotbook::sync::mirror::MirrorHandle;
use slotbook::sync::{HttpRemote, RemoteMirror, SyncController};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    // Console owns stdout; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::from_env();
    slotbook::observability::init(config.metrics_port)?;

    let store = Arc::new(FileStore::open(&config.data_dir)?);
    let http = config.remote_url.clone().map(|url| Arc::new(HttpRemote::new(url)));
    let remote: Option<Arc<dyn RemoteMirror>> = http.clone().map(|h| h as Arc<dyn RemoteMirror>);

    let mut engine = Engine::open(store, Arc::new(SystemClock), config.offset, Arc::new(NotifyHub::new()))?;
    if let Some(remote) = &remote {
        engine = engine.with_mirror(MirrorHandle::spawn(remote.clone()));
    }
    let engine = Arc::new(engine);

    info!("slotbook starting");
    info!("  data_dir: {}", config.data_dir.display());
    info!("  remote: {}", http.as_ref().map_or("disabled", |h| h.endpoint()));
    info!("  workday: {:02}:00-{:02}:00", config.window.start_hour, config.window.end_hour);

    let report = engine.sweep_expired().await?;
    if !report.is_empty() {
        info!("removed {} expired booking(s) at startup", report.removed.len());
    }

    let sync = remote.map(|remote| {
        let sync = Arc::new(SyncController::new(engine.clone(), remote, config.poll_interval));
        tokio::spawn(sync.clone().run_poller());
        sync
    });

    let mut console = Console::new(engine.clone(), sync, config);
    let mut stdout = tokio::io::stdout();
    stdout.write_all(console.render_dashboard().await.as_bytes()).await?;
    stdout.write_all(b"\ntype `help` for commands\n> ").await?;
    stdout.flush().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    stdout.write_all(b"> ").await?;
                    stdout.flush().await?;
                    continue;
                }
                let text = match parse_command(&line) {
                    Ok(cmd) => match console.execute(cmd).await {
                        Reply::Text(text) => text,
                        Reply::Quit => break,
                    },
                    Err(e) => e.to_string(),
                };
                stdout.write_all(text.as_bytes()).await?;
                if !text.ends_with('\n') {
                    stdout.write_all(b"\n").await?;
                }
                stdout.write_all(b"> ").await?;
                stdout.flush().await?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received");
                break;
            }
        }
    }

    if let Some(mirror) = engine.mirror() {
        info!("flushing pending mirror pushes...");
        mirror.flush().await;
    }
    info!("slotbook stopped");
    Ok(())
}
