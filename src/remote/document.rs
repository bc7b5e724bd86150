//! Status-document codec for the contents API.
//!
//! The envelope of a `GET` carries the Base64-wrapped document plus the
//! revision marker (`sha`) required for a safe overwrite:
//!
//! ```text
//! GET  ─▶ { "content": "eyJzZW5zb3IyIjog…", "sha": "<opaque>", … }
//!          content ─b64─▶ {"sensor2": <bool>}
//! PUT  ◀─ { "message": "…", "content": "<b64>", "sha": "<opaque>" }
//! ```

use serde::{Deserialize, Serialize};

use super::b64;
use crate::error::{DecodeError, Result};

/// Commit message used for every overwrite of the status document.
pub const UPDATE_MESSAGE: &str = "update sensor 2 status";

/// The fields of the `GET` envelope we actually consume.
#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: String,
    sha: String,
}

/// The decoded document body shared by both nodes.
#[derive(Debug, Serialize, Deserialize)]
struct StatusDocument {
    sensor2: bool,
}

/// A parsed `GET` of the status document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    /// The shared boolean flag.
    pub sensor2: bool,
    /// Opaque revision marker, echoed back on `PUT`.
    pub sha: String,
}

/// Parse a `GET` response body into the flag and its revision marker.
pub fn parse_document(body: &str) -> Result<FetchedDocument> {
    let envelope: ContentsResponse =
        serde_json::from_str(body).map_err(|_| DecodeError::BadJson)?;
    let decoded = b64::decode(&envelope.content)?;
    let doc: StatusDocument =
        serde_json::from_slice(&decoded).map_err(|_| DecodeError::BadJson)?;
    Ok(FetchedDocument {
        sensor2: doc.sensor2,
        sha: envelope.sha,
    })
}

/// Parse only the revision marker (the publisher's read-modify-write needs
/// the `sha` even when the current flag value is irrelevant).
pub fn parse_sha(body: &str) -> Result<String> {
    let envelope: ContentsResponse =
        serde_json::from_str(body).map_err(|_| DecodeError::BadJson)?;
    Ok(envelope.sha)
}

/// Build the `PUT` request body that overwrites the document with `flag`.
///
/// The inner document is formatted with a fixed byte layout
/// (`{"sensor2": true}` with a space), so both nodes round-trip an
/// identical blob.
pub fn put_body(flag: bool, sha: &str) -> String {
    let inner = format!("{{\"sensor2\": {flag}}}");
    let encoded = b64::encode(inner.as_bytes());
    serde_json::json!({
        "message": UPDATE_MESSAGE,
        "content": encoded,
        "sha": sha,
    })
    .to_string()
}
