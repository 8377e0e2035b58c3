use depthbook_integration::error::SocketError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors generated in `depthbook-data`.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize, Error)]
pub enum DataError {
    #[error("SocketError: {0}")]
    Socket(String),

    #[error("unsupported feed payload: {0}")]
    UnsupportedPayload(String),

    #[error("failed to deserialise feed payload: {error} for payload: {payload}")]
    Deserialise { error: String, payload: String },

    #[error("unexpected feed event type: {0}")]
    UnexpectedEvent(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<SocketError> for DataError {
    fn from(value: SocketError) -> Self {
        match value {
            SocketError::Unsupported { entity, item } => {
                Self::UnsupportedPayload(format!("{entity}: {item}"))
            }
            SocketError::Deserialise { error, payload } => Self::Deserialise {
                error: error.to_string(),
                payload,
            },
            other => Self::Socket(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_error_from_socket_error() {
        struct TestCase {
            input: SocketError,
            expected: DataError,
        }

        let tests = vec![
            TestCase {
                // TC0: unsupported payload keeps its own variant
                input: SocketError::Unsupported {
                    entity: "WebSocket payload",
                    item: "Ping".to_string(),
                },
                expected: DataError::UnsupportedPayload("WebSocket payload: Ping".to_string()),
            },
            TestCase {
                // TC1: deserialisation failure keeps the offending payload
                input: SocketError::Deserialise {
                    error: serde_json::from_str::<u64>("x").unwrap_err(),
                    payload: "x".to_string(),
                },
                expected: DataError::Deserialise {
                    error: serde_json::from_str::<u64>("x").unwrap_err().to_string(),
                    payload: "x".to_string(),
                },
            },
            TestCase {
                // TC2: every other socket error is stringified
                input: SocketError::Terminated("eof".to_string()),
                expected: DataError::Socket("transport session terminated: eof".to_string()),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = DataError::from(test.input);
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }
}
