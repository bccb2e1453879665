//! TCP intake for the hotcue event stream.
//!
//! Every accepted connection is decoded on its own task; events from one
//! connection are forwarded in arrival order. A broken connection only ends
//! its own task. Bind failures and non-transient accept failures end the
//! whole listener and are returned to the caller.

use std::io;
use std::net::SocketAddr;

use chrono::Utc;
use hotcue_core::{HotcueEvent, Shutdown};
use thiserror::Error;
use tokio::io::AsyncRead;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::decoder::{DecodeError, EventDecoder};

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to bind event listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("event listener accept failed: {0}")]
    Accept(#[source] io::Error),
}

pub async fn bind_events(addr: &str) -> Result<TcpListener, ListenerError> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| ListenerError::Bind {
            addr: addr.to_string(),
            source,
        })
}

/// Accept connections until shutdown. Returns `Err` only for a fatal accept
/// failure; open connections are dropped either way.
pub async fn serve_events(
    listener: TcpListener,
    events: mpsc::Sender<HotcueEvent>,
    shutdown: Shutdown,
) -> Result<(), ListenerError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "event listener ready");
    }

    let mut connections = JoinSet::new();
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                tracing::info!("event listener shutting down");
                break;
            }
            Some(_) = connections.join_next(), if !connections.is_empty() => {}
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tracing::debug!(%peer, "event connection opened");
                    connections.spawn(serve_connection(
                        stream,
                        peer,
                        events.clone(),
                        shutdown.clone(),
                    ));
                }
                Err(e) if is_transient(&e) => {
                    tracing::debug!(error = %e, "transient accept error");
                }
                Err(e) => return Err(ListenerError::Accept(e)),
            },
        }
    }

    connections.shutdown().await;
    Ok(())
}

fn is_transient(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
    )
}

async fn serve_connection<R>(
    reader: R,
    peer: SocketAddr,
    events: mpsc::Sender<HotcueEvent>,
    shutdown: Shutdown,
) where
    R: AsyncRead + Unpin,
{
    let mut decoder = EventDecoder::new(reader);
    let outcome = tokio::select! {
        _ = shutdown.cancelled() => Ok(()),
        res = forward(&mut decoder, &events) => res,
    };
    match outcome {
        Ok(()) => tracing::debug!(%peer, "event connection closed"),
        Err(e) => tracing::warn!(%peer, error = %e, "event connection dropped"),
    }
}

async fn forward<R: AsyncRead + Unpin>(
    decoder: &mut EventDecoder<R>,
    events: &mpsc::Sender<HotcueEvent>,
) -> Result<(), DecodeError> {
    while let Some(event) = decoder.next_event().await? {
        if events.send(event.stamped(Utc::now())).await.is_err() {
            // Orchestrator gone; nothing left to feed.
            break;
        }
    }
    Ok(())
}
