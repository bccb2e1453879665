use rosc::{OscMessage, OscPacket, OscType};
use std::net::{ToSocketAddrs, UdpSocket};

use super::udp::unspecified_for;
use super::{bounded, OscTarget, Protocol, Result, RouterError};
use crate::shutdown::Shutdown;

/// Send one OSC message whose single string argument is the payload.
///
/// The socket work runs on the blocking pool, so it cannot be interrupted;
/// the race in [`bounded`] still returns on timeout or shutdown and the
/// blocking task is left to finish on its own.
pub(super) async fn send(target: &OscTarget, payload: Vec<u8>, shutdown: &Shutdown) -> Result<()> {
    let (host, port) = split_host_port(&target.addr)?;
    let packet = encode(target.path(), payload)?;

    let task = tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let remote = (host.as_str(), port).to_socket_addrs()?.next().ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no address found for {host}"),
            )
        })?;
        let socket = UdpSocket::bind(unspecified_for(&remote))?;
        socket.send_to(&packet, remote)?;
        Ok(())
    });

    let completion = async move {
        match task.await {
            Ok(sent) => sent.map_err(RouterError::from),
            Err(join) => Err(RouterError::Io(std::io::Error::other(join))),
        }
    };
    bounded(Protocol::Osc, target.timeout(), shutdown, completion).await
}

fn encode(path: &str, payload: Vec<u8>) -> Result<Vec<u8>> {
    let text = String::from_utf8(payload)
        .map_err(|e| RouterError::Osc(format!("payload is not utf-8: {e}")))?;
    let packet = OscPacket::Message(OscMessage {
        addr: path.to_string(),
        args: vec![OscType::String(text)],
    });
    rosc::encoder::encode(&packet).map_err(|e| RouterError::Osc(format!("{e:?}")))
}

/// Split `host:port`, accepting bracketed IPv6 hosts.
fn split_host_port(addr: &str) -> Result<(String, u16)> {
    let invalid = || {
        RouterError::invalid(
            Protocol::Osc,
            format!("osc addr must be host:port, got {addr:?}"),
        )
    };
    let (host, port) = addr.rsplit_once(':').ok_or_else(invalid)?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(invalid());
    }
    let port = port.parse::<u16>().map_err(|_| invalid())?;
    Ok((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_host_and_port() {
        assert_eq!(
            split_host_port("127.0.0.1:9000").unwrap(),
            ("127.0.0.1".to_string(), 9000)
        );
        assert_eq!(split_host_port("[::1]:53").unwrap(), ("::1".to_string(), 53));
        assert_eq!(
            split_host_port("lights.local:8000").unwrap(),
            ("lights.local".to_string(), 8000)
        );
    }

    #[test]
    fn rejects_malformed_addresses() {
        for addr in ["", "127.0.0.1", ":9000", "host:port", "host:70000"] {
            let err = split_host_port(addr).unwrap_err();
            assert!(err.is_config_error(), "{addr} should be a config error");
        }
    }

    #[test]
    fn encodes_single_string_argument() {
        let bytes = encode("/trigger", br#"{"cueName":"Drop"}"#.to_vec()).unwrap();
        let (_, packet) = rosc::decoder::decode_udp(&bytes).unwrap();
        let OscPacket::Message(msg) = packet else {
            panic!("expected message");
        };
        assert_eq!(msg.addr, "/trigger");
        assert_eq!(
            msg.args,
            vec![OscType::String(r#"{"cueName":"Drop"}"#.to_string())]
        );
    }
}
