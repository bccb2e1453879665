use std::net::SocketAddr;
use tokio::net::UdpSocket;

use super::{bounded, Protocol, Result, RouterError, UdpTarget};
use crate::shutdown::Shutdown;

/// One datagram, no acknowledgement. Only local resolve/bind/write errors
/// surface.
pub(super) async fn send(target: &UdpTarget, payload: &[u8], shutdown: &Shutdown) -> Result<()> {
    if target.addr.is_empty() {
        return Err(RouterError::invalid(Protocol::Udp, "udp addr is required"));
    }

    bounded(
        Protocol::Udp,
        target.timeout(),
        shutdown,
        write_datagram(&target.addr, payload),
    )
    .await
}

async fn write_datagram(addr: &str, payload: &[u8]) -> Result<()> {
    let remote = resolve(addr).await?;
    let socket = UdpSocket::bind(unspecified_for(&remote)).await?;
    socket.connect(remote).await?;
    socket.send(payload).await?;
    Ok(())
}

async fn resolve(addr: &str) -> Result<SocketAddr> {
    tokio::net::lookup_host(addr).await?.next().ok_or_else(|| {
        RouterError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no address found for {addr}"),
        ))
    })
}

/// Wildcard local address in the same family as `remote`.
pub(super) fn unspecified_for(remote: &SocketAddr) -> SocketAddr {
    match remote {
        SocketAddr::V4(_) => SocketAddr::from(([0, 0, 0, 0], 0)),
        SocketAddr::V6(_) => SocketAddr::from(([0u16; 8], 0)),
    }
}
