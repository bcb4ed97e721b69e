//! Ambient widget daemon.
//!
//! Owns a widget registry, drives its frame clock at a target rate and
//! serves newline-delimited JSON requests over TCP.

mod config;
mod daemon;
mod error;
mod paths;

use std::cell::RefCell;
use std::rc::Rc;

use ambient::protocol::{encode_line, Request, Response};
use ambient::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tracing::{error, info, warn};

use config::DaemonConfig;
use daemon::Daemon;
use error::DaemonError;
use paths::AppPaths;

/// Handles shared by the tasks on the daemon's single thread.
#[derive(Clone)]
struct Shared {
    daemon: Rc<RefCell<Daemon>>,
    /// Wakes the frame loop after a request, since it parks while the clock is idle.
    wake: Rc<Notify>,
    shutdown: Rc<Notify>,
}

fn main() -> Result<(), DaemonError> {
    tracing_subscriber::fmt::init();

    let paths = AppPaths::new()?;
    info!("Data directory: {:?}", paths.data_dir());

    let mut config = DaemonConfig::load(&paths.config_file())?;
    config.apply_args(std::env::args().skip(1))?;

    // The registry is single-threaded, so every task runs on one LocalSet.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = tokio::task::LocalSet::new();
    local.block_on(&runtime, run(config, paths))
}

async fn run(config: DaemonConfig, paths: AppPaths) -> Result<(), DaemonError> {
    let mut daemon = Daemon::new(&config, paths);
    match daemon.load() {
        Ok(n) if n > 0 => info!("Loaded {} saved widget(s)", n),
        Ok(_) => {}
        Err(e) => warn!("Could not load saved widgets: {}", e),
    }

    let shared = Shared {
        daemon: Rc::new(RefCell::new(daemon)),
        wake: Rc::new(Notify::new()),
        shutdown: Rc::new(Notify::new()),
    };

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("ambientd listening on {}", config.bind_addr);

    tokio::task::spawn_local(frame_loop(shared.clone()));

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                info!("Client connected: {}", peer);
                let shared = shared.clone();
                tokio::task::spawn_local(async move {
                    if let Err(e) = handle_client(stream, shared).await {
                        error!("Client error: {}", e);
                    }
                });
            }
            _ = shared.shutdown.notified() => {
                info!("Shutdown requested");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl-C, saving widgets...");
                if let Err(e) = shared.daemon.borrow().save() {
                    error!("Failed to save widgets: {}", e);
                }
                break;
            }
        }
    }

    info!("ambientd stopped");
    Ok(())
}

/// Tick the clock at the target rate; park while nothing would run.
async fn frame_loop(shared: Shared) {
    loop {
        let (idle, fps) = {
            let d = shared.daemon.borrow();
            (d.registry().clock().is_idle(), d.target_fps())
        };
        if idle {
            shared.wake.notified().await;
            continue;
        }

        tokio::time::sleep(Duration::from_millis((1000 / fps as u64).max(1))).await;
        shared.daemon.borrow().registry().clock().tick_at(Instant::now());
    }
}

async fn handle_client(stream: TcpStream, shared: Shared) -> Result<(), DaemonError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        let (response, shutdown) = match serde_json::from_str::<Request>(&line) {
            Ok(req) => {
                let reply = shared.daemon.borrow_mut().handle(req);
                (reply.response, reply.shutdown)
            }
            Err(e) => (Response::error(format!("Invalid request: {e}")), false),
        };

        writer.write_all(encode_line(&response)?.as_bytes()).await?;
        shared.wake.notify_one();

        if shutdown {
            shared.shutdown.notify_one();
            break;
        }
    }

    Ok(())
}
