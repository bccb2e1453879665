use anyhow::{Context, Result};
use hotcue_core::config::{Config, WarnLevel};
use hotcue_core::{Orchestrator, Shutdown, ShutdownTrigger};
use hotcue_server::{bind_events, serve_config_on, serve_events, AppState};
use std::future::Future;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};

pub fn run(path: &Path, events_addr: Option<String>, config_addr: Option<String>) -> Result<()> {
    let mut config = Config::load(path).context("failed to load config")?;
    if let Some(addr) = events_addr {
        config.listen.events = addr;
    }
    if let Some(addr) = config_addr {
        config.listen.config = addr;
    }

    let warnings = config.validate();
    for w in &warnings {
        match w.level {
            WarnLevel::Warning => tracing::warn!("{}", w.message),
            WarnLevel::Error => tracing::error!("{}", w.message),
        }
    }
    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(serve(config))
}

type Intake = (&'static str, Result<()>);

async fn serve(config: Config) -> Result<()> {
    let (trigger, shutdown) = Shutdown::new();
    let (snapshot_tx, snapshot_rx) = mpsc::channel(config.queues.snapshots);
    let (event_tx, event_rx) = mpsc::channel(config.queues.events);

    let orchestrator = Orchestrator::new(config.router(), config.dispatcher(), shutdown.clone());
    let state = AppState::new(snapshot_tx, Arc::clone(orchestrator.snapshot_cell()));

    let events = bind_events(&config.listen.events).await?;
    let http = tokio::net::TcpListener::bind(&config.listen.config)
        .await
        .with_context(|| format!("failed to bind config endpoint on {}", config.listen.config))?;

    tracing::info!(
        events = %config.listen.events,
        config = %config.listen.config,
        targets = config.targets.len(),
        "hotcue-mesh serving"
    );

    let core = tokio::spawn(orchestrator.run(snapshot_rx, event_rx));

    let mut intakes: JoinSet<Intake> = JoinSet::new();
    let sd = shutdown.clone();
    intakes.spawn(async move {
        let res = serve_events(events, event_tx, sd).await;
        ("event intake", res.map_err(anyhow::Error::from))
    });
    intakes.spawn(async move {
        let res = serve_config_on(http, state, shutdown).await;
        ("config endpoint", res)
    });

    supervise(tokio::signal::ctrl_c(), trigger, core, intakes).await
}

/// Run until `stop` resolves or any task ends on its own, then shut the rest
/// down. An intake or the orchestrator ending first means it failed; the
/// service goes down with it rather than run half-deaf.
async fn supervise(
    stop: impl Future<Output = io::Result<()>>,
    trigger: ShutdownTrigger,
    mut core: JoinHandle<()>,
    mut intakes: JoinSet<Intake>,
) -> Result<()> {
    let mut core_done = false;
    let mut result = tokio::select! {
        signal = stop => {
            tracing::info!("ctrl-c received, shutting down");
            signal.context("failed to listen for ctrl-c")
        }
        Some(joined) = intakes.join_next() => finished(joined),
        joined = &mut core => {
            core_done = true;
            core_finished(joined)
        }
    };

    trigger.cancel();
    while let Some(joined) = intakes.join_next().await {
        let res = finished(joined);
        if result.is_ok() {
            result = res;
        }
    }
    if !core_done {
        core.await.context("orchestrator task failed")?;
    }

    result
}

fn finished(joined: std::result::Result<Intake, JoinError>) -> Result<()> {
    match joined {
        Ok((name, Ok(()))) => {
            tracing::info!("{name} stopped");
            Ok(())
        }
        Ok((name, Err(e))) => {
            tracing::error!(error = %format!("{e:#}"), "{name} failed");
            Err(e.context(format!("{name} failed")))
        }
        Err(e) => Err(anyhow::Error::from(e).context("intake task panicked")),
    }
}

fn core_finished(joined: std::result::Result<(), JoinError>) -> Result<()> {
    let err = match joined {
        Ok(()) => anyhow::anyhow!("orchestrator stopped before shutdown"),
        Err(e) => anyhow::Error::from(e).context("orchestrator task failed"),
    };
    tracing::error!(error = %format!("{err:#}"), "orchestrator ended, shutting down");
    Err(err)
}
