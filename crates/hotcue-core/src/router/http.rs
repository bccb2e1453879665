use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;

use super::{bounded, HttpTarget, Protocol, Result, RouterError};
use crate::shutdown::Shutdown;

/// Longest slice of an error response body kept in the error.
const MAX_ERROR_BODY_BYTES: usize = 4096;

pub(super) async fn send(
    client: &reqwest::Client,
    target: &HttpTarget,
    payload: &[u8],
    shutdown: &Shutdown,
) -> Result<()> {
    if target.url.is_empty() {
        return Err(RouterError::invalid(Protocol::Http, "http url is required"));
    }
    let method = Method::from_bytes(target.method().as_bytes()).map_err(|_| {
        RouterError::invalid(
            Protocol::Http,
            format!("invalid method {:?}", target.method()),
        )
    })?;
    let headers = headers(target)?;
    let timeout = target.timeout();

    let request = client
        .request(method.clone(), &target.url)
        .headers(headers)
        .timeout(timeout)
        .body(payload.to_vec());

    bounded(Protocol::Http, timeout, shutdown, execute(request, method)).await
}

async fn execute(request: reqwest::RequestBuilder, method: Method) -> Result<()> {
    let mut response = request.send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }

    let mut body = Vec::new();
    while body.len() < MAX_ERROR_BODY_BYTES {
        match response.chunk().await {
            Ok(Some(chunk)) => body.extend_from_slice(&chunk),
            Ok(None) | Err(_) => break,
        }
    }
    body.truncate(MAX_ERROR_BODY_BYTES);

    Err(RouterError::HttpStatus {
        method: method.to_string(),
        status: status.as_u16(),
        body: String::from_utf8_lossy(&body).trim().to_string(),
    })
}

/// `Content-Type: application/json`, then the target's headers on top.
fn headers(target: &HttpTarget) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    for (name, value) in &target.headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            RouterError::invalid(Protocol::Http, format!("invalid header name {name:?}"))
        })?;
        let value = HeaderValue::from_str(value).map_err(|_| {
            RouterError::invalid(Protocol::Http, format!("invalid value for header {name}"))
        })?;
        map.insert(name, value);
    }
    Ok(map)
}
