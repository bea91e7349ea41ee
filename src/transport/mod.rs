//! Shared HTTP plumbing.
//!
//! Every outbound call (snapshot fetch, workflow invocation, store upsert) goes
//! through a `ureq::Agent` built here so the timeout is applied uniformly.

use std::io::Read;
use std::time::Duration;

/// Largest response body we will buffer, snapshot or JSON.
pub const MAX_BODY_BYTES: u64 = 10 * 1024 * 1024;

/// Build the process-wide blocking HTTP agent.
pub fn http_agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(timeout)
        .user_agent(concat!("webcam-indexer/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Read a response body, refusing anything over `MAX_BODY_BYTES`.
pub fn read_body(response: ureq::Response) -> std::io::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    response
        .into_reader()
        .take(MAX_BODY_BYTES + 1)
        .read_to_end(&mut bytes)?;
    if bytes.len() as u64 > MAX_BODY_BYTES {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("response body exceeds {} bytes", MAX_BODY_BYTES),
        ));
    }
    Ok(bytes)
}

/// Best-effort body text for error messages.
pub fn body_text(response: ureq::Response) -> String {
    match read_body(response) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => format!("<unreadable body: {}>", e),
    }
}
