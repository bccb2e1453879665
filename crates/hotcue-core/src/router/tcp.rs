use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use super::{bounded, Protocol, Result, RouterError, TcpTarget};
use crate::shutdown::Shutdown;

/// One connection per send: dial, write the raw payload, close. No framing
/// is added. Dial and write are each bounded by the target timeout.
pub(super) async fn send(target: &TcpTarget, payload: &[u8], shutdown: &Shutdown) -> Result<()> {
    if target.addr.is_empty() {
        return Err(RouterError::invalid(Protocol::Tcp, "tcp addr is required"));
    }
    let timeout = target.timeout();

    let connect = async {
        TcpStream::connect(target.addr.as_str())
            .await
            .map_err(RouterError::from)
    };
    let stream = bounded(Protocol::Tcp, timeout, shutdown, connect).await?;

    bounded(Protocol::Tcp, timeout, shutdown, write_and_close(stream, payload)).await
}

async fn write_and_close(mut stream: TcpStream, payload: &[u8]) -> Result<()> {
    stream.write_all(payload).await?;
    stream.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn refused_connection_is_a_send_error() {
        // Bind then drop to get a port nothing listens on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let mut target = TcpTarget::new(format!("127.0.0.1:{port}"));
        target.timeout_ms = Some(500);
        let err = send(&target, b"{}", &Shutdown::never()).await.unwrap_err();
        assert!(!err.is_config_error());
    }

    #[tokio::test]
    async fn cancelled_before_dial_returns_cancelled() {
        let (trigger, shutdown) = Shutdown::new();
        trigger.cancel();
        let mut target = TcpTarget::new("10.255.255.1:9");
        target.timeout_ms = Some(10_000);
        let err = tokio::time::timeout(Duration::from_secs(2), send(&target, b"{}", &shutdown))
            .await
            .expect("cancellation should be prompt")
            .unwrap_err();
        assert!(matches!(err, RouterError::Cancelled));
    }
}
