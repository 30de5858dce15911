use std::time::Duration;
use tracing::debug;

use super::GenerationError;

#[inline]
pub(crate) fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

/// POST a JSON body and return the response text.
///
/// One attempt only. Non-2xx statuses surface as [`GenerationError::Status`]
/// before any body parsing happens.
pub(crate) fn post_json(
    agent: &ureq::Agent,
    url: &str,
    headers: &[(&str, &str)],
    body: &str,
) -> Result<String, GenerationError> {
    debug!("POST {} ({} bytes)", url, body.len());

    let mut request = agent
        .post(url)
        .header("content-type", "application/json");
    for (name, value) in headers {
        request = request.header(*name, *value);
    }

    request
        .send(body)
        .and_then(|mut resp| resp.body_mut().read_to_string())
        .map_err(|error| match error {
            ureq::Error::StatusCode(status) => GenerationError::Status { status },
            other => GenerationError::Transport(other.to_string()),
        })
}
