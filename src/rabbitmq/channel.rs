// src/rabbitmq/channel.rs
// The channel collaborator: an open, correlated request/response conduit.

use async_trait::async_trait;
use std::fmt;

use super::errors::{BrokerClose, ChannelFault};
use crate::exchange::request::{BindRequest, DeclareRequest, DeleteRequest, UnbindRequest};

/// The `*-ok` confirmations of the exchange class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Confirmation {
    DeclareOk,
    DeleteOk,
    BindOk,
    UnbindOk,
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Confirmation::DeclareOk => "exchange.declare-ok",
            Confirmation::DeleteOk => "exchange.delete-ok",
            Confirmation::BindOk => "exchange.bind-ok",
            Confirmation::UnbindOk => "exchange.unbind-ok",
        };
        f.write_str(name)
    }
}

/// A fully built request, ready to be handed to a channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Method {
    Declare(DeclareRequest),
    Delete(DeleteRequest),
    Bind(BindRequest),
    Unbind(UnbindRequest),
}

impl Method {
    pub fn no_wait(&self) -> bool {
        match self {
            Method::Declare(req) => req.no_wait(),
            Method::Delete(req) => req.no_wait(),
            Method::Bind(req) => req.no_wait(),
            Method::Unbind(req) => req.no_wait(),
        }
    }
}

/// Everything a channel may correlate back to a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The broker confirmed a request.
    Confirmed(Confirmation),
    /// A no-wait request was accepted for transmission; nothing else will follow.
    Accepted,
    /// The broker closed the channel instead of answering.
    Closed(BrokerClose),
    /// Some other method frame.
    Method { class_id: u16, method_id: u16 },
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Confirmed(confirmation) => write!(f, "{}", confirmation),
            Reply::Accepted => f.write_str("no-wait acceptance"),
            Reply::Closed(close) => write!(f, "channel.close {}", close),
            Reply::Method {
                class_id,
                method_id,
            } => write!(f, "method {}.{}", class_id, method_id),
        }
    }
}

/// Anything that can carry an exchange method to the broker and hand back
/// the correlated reply.
///
/// Calls take `&mut self`: a channel is a single sequential correlation
/// context, so two calls on the same channel can never overlap.
#[async_trait]
pub trait ExchangeChannel: Send {
    async fn call(&mut self, method: Method) -> Result<Reply, ChannelFault>;
}
