use std::time::Duration;

use serde::de::DeserializeOwned;
use thiserror::Error;

pub(crate) const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub(crate) const READ_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_ERROR_BODY_CHARS: usize = 240;

#[derive(Debug, Error)]
pub(crate) enum HttpError {
    #[error("HTTP status {status}{}", body_suffix(.body))]
    Status { status: u16, body: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("response decode failed: {0}")]
    Decode(String),
}

impl HttpError {
    pub(crate) fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

fn body_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(" ({body})")
    }
}

pub(crate) fn build_agent(connect_timeout: Duration, read_timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(connect_timeout)
        .timeout_read(read_timeout)
        .timeout_write(read_timeout)
        .build()
}

pub(crate) fn default_agent() -> ureq::Agent {
    build_agent(CONNECT_TIMEOUT, READ_TIMEOUT)
}

pub(crate) fn read_text(result: Result<ureq::Response, ureq::Error>) -> Result<String, HttpError> {
    match result {
        Ok(response) => response
            .into_string()
            .map_err(|err| HttpError::Decode(err.to_string())),
        Err(ureq::Error::Status(status, response)) => {
            let response_body = response.into_string().ok().unwrap_or_default();
            let body = response_body
                .trim()
                .chars()
                .take(MAX_ERROR_BODY_CHARS)
                .collect::<String>();
            Err(HttpError::Status { status, body })
        }
        Err(ureq::Error::Transport(err)) => Err(HttpError::Transport(err.to_string())),
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(
    result: Result<ureq::Response, ureq::Error>,
) -> Result<T, HttpError> {
    let body = read_text(result)?;
    serde_json::from_str(&body).map_err(|err| HttpError::Decode(err.to_string()))
}
