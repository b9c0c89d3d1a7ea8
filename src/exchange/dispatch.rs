// src/exchange/dispatch.rs
// Sends one built request and checks the single reply correlated to it.

use tracing::{debug, info, warn};

use super::request::{Operation, Request};
use crate::rabbitmq::channel::{Confirmation, ExchangeChannel, Reply};
use crate::rabbitmq::errors::{ChannelFault, ExchangeError, FaultDetail, Result};

/// How a successful call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The broker sent the matching confirmation.
    Confirmed(Confirmation),
    /// A no-wait request was handed to the channel; the broker will not answer.
    Accepted,
}

impl Outcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Outcome::Confirmed(_))
    }
}

/// What the dispatcher waits for after sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expectation {
    Confirmation(Confirmation),
    Acceptance,
}

impl Expectation {
    pub fn for_request(operation: Operation, no_wait: bool) -> Self {
        if no_wait {
            Expectation::Acceptance
        } else {
            Expectation::Confirmation(operation.confirmation())
        }
    }
}

/// Performs one call on `channel`. No retries; the first fault is returned.
pub async fn call<C, R>(channel: &mut C, request: R) -> Result<Outcome>
where
    C: ExchangeChannel + ?Sized,
    R: Request,
{
    let operation = R::OPERATION;
    let target = request.target();
    let expectation = Expectation::for_request(operation, request.no_wait());
    debug!(
        operation = operation.as_str(),
        exchange = %target,
        no_wait = request.no_wait(),
        "Sending request"
    );

    let reply = match channel.call(request.into()).await {
        Ok(reply) => reply,
        Err(fault) => {
            warn!(
                operation = operation.as_str(),
                exchange = %target,
                error = %fault,
                "Channel fault"
            );
            return Err(ExchangeError::ProtocolFault {
                operation: operation.as_str(),
                target,
                detail: fault.into(),
            });
        }
    };

    let outcome = check_reply(operation, &target, expectation, reply)?;
    info!(
        operation = operation.as_str(),
        exchange = %target,
        outcome = ?outcome,
        "Request completed"
    );
    Ok(outcome)
}

/// Matches a reply against what the request asked for.
pub fn check_reply(
    operation: Operation,
    target: &str,
    expectation: Expectation,
    reply: Reply,
) -> Result<Outcome> {
    let expected = operation.confirmation();
    match (expectation, reply) {
        (Expectation::Confirmation(_), Reply::Confirmed(c)) if c == expected => {
            Ok(Outcome::Confirmed(c))
        }
        (Expectation::Acceptance, Reply::Accepted) => Ok(Outcome::Accepted),
        // tolerated: some transports still surface the broker's answer
        (Expectation::Acceptance, Reply::Confirmed(c)) if c == expected => Ok(Outcome::Accepted),
        (Expectation::Confirmation(_), Reply::Accepted) => {
            warn!(
                operation = operation.as_str(),
                exchange = target,
                "Channel skipped the confirmation of a synchronous request"
            );
            Err(ExchangeError::UnexpectedResponse {
                operation: operation.as_str(),
                target: target.to_string(),
                reply: Reply::Accepted,
            })
        }
        (_, Reply::Closed(close)) => {
            warn!(
                operation = operation.as_str(),
                exchange = target,
                reply_code = close.reply_code,
                reply_text = %close.reply_text,
                "Broker closed the channel"
            );
            Err(ExchangeError::ProtocolFault {
                operation: operation.as_str(),
                target: target.to_string(),
                detail: FaultDetail::Channel(ChannelFault::Closed(close)),
            })
        }
        (_, other) => {
            warn!(
                operation = operation.as_str(),
                exchange = target,
                reply = %other,
                "Mismatched reply"
            );
            Err(ExchangeError::ProtocolFault {
                operation: operation.as_str(),
                target: target.to_string(),
                detail: FaultDetail::Mismatch {
                    expected: expected.to_string(),
                    received: other.to_string(),
                },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rabbitmq::errors::BrokerClose;

    fn not_found() -> BrokerClose {
        BrokerClose {
            reply_code: 404,
            reply_text: "NOT_FOUND - no exchange 'src'".to_string(),
            class_id: Some(40),
            method_id: Some(30),
        }
    }

    #[test]
    fn matching_confirmation_succeeds() {
        let expectation = Expectation::for_request(Operation::Bind, false);
        let reply = Reply::Confirmed(Confirmation::BindOk);
        let outcome = check_reply(Operation::Bind, "orders", expectation, reply);
        assert_eq!(outcome.unwrap(), Outcome::Confirmed(Confirmation::BindOk));
    }

    #[test]
    fn wrong_confirmation_is_a_protocol_fault() {
        let expectation = Expectation::for_request(Operation::Declare, false);
        let err = check_reply(
            Operation::Declare,
            "orders",
            expectation,
            Reply::Confirmed(Confirmation::DeleteOk),
        )
        .unwrap_err();

        match err {
            ExchangeError::ProtocolFault {
                operation,
                target,
                detail: FaultDetail::Mismatch { expected, received },
            } => {
                assert_eq!(operation, "exchange.declare");
                assert_eq!(target, "orders");
                assert_eq!(expected, "exchange.declare-ok");
                assert_eq!(received, "exchange.delete-ok");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn foreign_method_is_a_protocol_fault() {
        let expectation = Expectation::for_request(Operation::Delete, false);
        let err = check_reply(
            Operation::Delete,
            "orders",
            expectation,
            Reply::Method {
                class_id: 50,
                method_id: 11,
            },
        )
        .unwrap_err();
        assert!(err.is_protocol_fault());
    }

    #[test]
    fn broker_close_is_a_protocol_fault() {
        let expectation = Expectation::for_request(Operation::Bind, false);
        let err = check_reply(Operation::Bind, "orders", expectation, Reply::Closed(not_found()))
            .unwrap_err();
        match err {
            ExchangeError::ProtocolFault {
                detail: FaultDetail::Channel(ChannelFault::Closed(close)),
                ..
            } => assert_eq!(close.reply_code, 404),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn acceptance_for_synchronous_request_is_unexpected() {
        let expectation = Expectation::for_request(Operation::Unbind, false);
        let err =
            check_reply(Operation::Unbind, "orders", expectation, Reply::Accepted).unwrap_err();
        assert!(matches!(err, ExchangeError::UnexpectedResponse { .. }));
    }

    #[test]
    fn no_wait_accepts_without_confirmation() {
        let expectation = Expectation::for_request(Operation::Declare, true);
        assert_eq!(expectation, Expectation::Acceptance);
        let outcome =
            check_reply(Operation::Declare, "orders", expectation, Reply::Accepted).unwrap();
        assert_eq!(outcome, Outcome::Accepted);
    }

    #[test]
    fn no_wait_still_surfaces_broker_close() {
        let expectation = Expectation::for_request(Operation::Delete, true);
        let err = check_reply(Operation::Delete, "orders", expectation, Reply::Closed(not_found()));
        assert!(err.unwrap_err().is_protocol_fault());
    }
}
