use crate::traits::{NetworkError, StreamError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeError {
    Stream(StreamError),

    Network(NetworkError),
}

impl core::fmt::Display for BridgeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BridgeError::Stream(error) => {
                write!(f, "Stream error: {}", error)
            }
            BridgeError::Network(error) => {
                write!(f, "Network error: {}", error)
            }
        }
    }
}

impl core::error::Error for BridgeError {}

impl From<StreamError> for BridgeError {
    fn from(error: StreamError) -> Self {
        BridgeError::Stream(error)
    }
}

impl From<NetworkError> for BridgeError {
    fn from(error: NetworkError) -> Self {
        BridgeError::Network(error)
    }
}
