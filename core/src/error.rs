use thiserror::Error;

/// Failures decoding a LoanPro response body.
///
/// Shape variance inside listings is absorbed by the resolver in
/// [`crate::envelope`]; these cover the cases that fail the whole call.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed response envelope: {source}; body: {body}")]
    Envelope {
        #[source]
        source: serde_json::Error,
        body: String,
    },
    #[error("failed to decode {entity}: {source}")]
    Payload {
        entity: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
