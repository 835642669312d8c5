//! Shared blocking HTTP client construction and response handling.

use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::LlmError;

/// Create the blocking HTTP client used by every network provider.
///
/// Config: connect timeout capped at 30s, request timeout from the caller,
/// rustls TLS, `skillrank/{version}` user-agent, redirect limit 10.
///
/// # Errors
///
/// Returns `LlmError::Http` if the TLS backend cannot be initialised.
pub fn default_client(timeout: Duration) -> Result<reqwest::blocking::Client, LlmError> {
    reqwest::blocking::Client::builder()
        .connect_timeout(timeout.min(Duration::from_secs(30)))
        .timeout(timeout)
        .user_agent(concat!("skillrank/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(LlmError::Http)
}

/// Send a request and decode a JSON body, mapping non-2xx replies to
/// `LlmError::Status` so the retry policy can classify them.
pub(crate) fn send_json<T: DeserializeOwned>(
    request: reqwest::blocking::RequestBuilder,
    timeout: Duration,
) -> Result<T, LlmError> {
    let response = request.send().map_err(|e| {
        if e.is_timeout() {
            LlmError::Timeout(timeout.as_secs())
        } else {
            LlmError::Http(e)
        }
    })?;
    let status = response.status();
    let text = response.text()?;
    if !status.is_success() {
        return Err(LlmError::Status {
            status: status.as_u16(),
            body: text,
        });
    }
    Ok(serde_json::from_str(&text)?)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_client_builds() {
        assert!(default_client(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn non_success_maps_to_status_error() {
        let (url, _rx, handle) = test_server::spawn(vec![test_server::json_response(
            "503 Service Unavailable",
            "{\"error\":\"busy\"}",
        )]);
        let client = default_client(Duration::from_secs(5)).unwrap();
        let result: Result<serde_json::Value, _> =
            send_json(client.get(format!("{url}/x")), Duration::from_secs(5));
        handle.join().unwrap();
        match result {
            Err(LlmError::Status { status, body }) => {
                assert_eq!(status, 503);
                assert!(body.contains("busy"));
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }
}
