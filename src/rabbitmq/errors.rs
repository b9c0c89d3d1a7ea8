// src/rabbitmq/errors.rs

use lapin::Error as LapinError;
use std::fmt;
use thiserror::Error;

use super::channel::Reply;

/// A `channel.close` sent by the broker in place of the expected reply.
///
/// `class_id` and `method_id` name the method that caused the close. They are
/// `None` when the channel does not surface them; lapin's `AMQPError` only
/// keeps the reply code and text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerClose {
    pub reply_code: u16,
    pub reply_text: String,
    pub class_id: Option<u16>,
    pub method_id: Option<u16>,
}

impl fmt::Display for BrokerClose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.reply_code, self.reply_text)?;
        if let (Some(class_id), Some(method_id)) = (self.class_id, self.method_id) {
            write!(f, " (class {}, method {})", class_id, method_id)?;
        }
        Ok(())
    }
}

/// Failures raised by the channel collaborator itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelFault {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("channel closed by broker: {0}")]
    Closed(BrokerClose),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// What went wrong once a request reached the channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FaultDetail {
    #[error(transparent)]
    Channel(#[from] ChannelFault),

    #[error("expected {expected}, received {received}")]
    Mismatch { expected: String, received: String },
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("invalid option `{key}`: {reason}")]
    InvalidOption { key: String, reason: String },

    #[error("{operation} `{target}` failed: {detail}")]
    ProtocolFault {
        operation: &'static str,
        target: String,
        detail: FaultDetail,
    },

    #[error("{operation} `{target}` received an unexpected response: {reply}")]
    UnexpectedResponse {
        operation: &'static str,
        target: String,
        reply: Reply,
    },
}

// Custom Result type for exchange operations
pub type Result<T> = std::result::Result<T, ExchangeError>;

impl ExchangeError {
    pub(crate) fn invalid_option(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ExchangeError::InvalidOption {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// The operation the error is tagged with, if it got as far as the channel.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            ExchangeError::InvalidOption { .. } => None,
            ExchangeError::ProtocolFault { operation, .. }
            | ExchangeError::UnexpectedResponse { operation, .. } => Some(*operation),
        }
    }

    /// The exchange (or `source -> destination` binding) the failed request addressed.
    pub fn target(&self) -> Option<&str> {
        match self {
            ExchangeError::InvalidOption { .. } => None,
            ExchangeError::ProtocolFault { target, .. }
            | ExchangeError::UnexpectedResponse { target, .. } => Some(target.as_str()),
        }
    }

    pub fn is_invalid_option(&self) -> bool {
        matches!(self, ExchangeError::InvalidOption { .. })
    }

    pub fn is_protocol_fault(&self) -> bool {
        matches!(self, ExchangeError::ProtocolFault { .. })
    }
}

// Converting from lapin errors
impl From<LapinError> for ChannelFault {
    fn from(error: LapinError) -> Self {
        match error {
            LapinError::ProtocolError(amqp_error) => ChannelFault::Closed(BrokerClose {
                reply_code: amqp_error.get_id(),
                reply_text: amqp_error.get_message().as_str().to_string(),
                class_id: None,
                method_id: None,
            }),
            LapinError::InvalidChannelState(state) => {
                ChannelFault::Transport(format!("channel is in state {:?}", state))
            }
            other => ChannelFault::Transport(other.to_string()),
        }
    }
}
