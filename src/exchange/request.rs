// src/exchange/request.rs
// Fully defaulted, validated, immutable requests of the exchange class.

use lapin::types::FieldTable;
use std::fmt;

use super::kind::ExchangeType;
use super::options::{check_short_str, BindOptions, DeclareOptions, DeleteOptions};
use crate::rabbitmq::channel::{Confirmation, Method};
use crate::rabbitmq::errors::{ExchangeError, Result};

/// The four topology operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Declare,
    Delete,
    Bind,
    Unbind,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Declare => "exchange.declare",
            Operation::Delete => "exchange.delete",
            Operation::Bind => "exchange.bind",
            Operation::Unbind => "exchange.unbind",
        }
    }

    /// The only reply that proves the operation succeeded.
    pub fn confirmation(&self) -> Confirmation {
        match self {
            Operation::Declare => Confirmation::DeclareOk,
            Operation::Delete => Confirmation::DeleteOk,
            Operation::Bind => Confirmation::BindOk,
            Operation::Unbind => Confirmation::UnbindOk,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request that maps to exactly one confirmation.
pub trait Request: Into<Method> {
    const OPERATION: Operation;

    fn no_wait(&self) -> bool;

    /// What the request addresses: the exchange name, or
    /// `source -> destination` for bindings.
    fn target(&self) -> String;
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclareRequest {
    name: String,
    kind: ExchangeType,
    passive: bool,
    durable: bool,
    auto_delete: bool,
    internal: bool,
    no_wait: bool,
    arguments: FieldTable,
}

impl DeclareRequest {
    /// An empty `name` addresses the default exchange.
    pub fn build(name: &str, kind: ExchangeType, options: DeclareOptions) -> Result<Self> {
        check_short_str("exchange", name)?;
        if kind.as_str().is_empty() {
            return Err(ExchangeError::invalid_option(
                "type",
                "exchange type must not be empty",
            ));
        }
        check_short_str("type", kind.as_str())?;
        check_argument_keys(&options.arguments)?;

        Ok(Self {
            name: name.to_string(),
            kind,
            passive: options.passive,
            durable: options.durable,
            auto_delete: options.auto_delete,
            internal: options.internal,
            no_wait: options.no_wait,
            arguments: options.arguments,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &ExchangeType {
        &self.kind
    }

    pub fn passive(&self) -> bool {
        self.passive
    }

    pub fn durable(&self) -> bool {
        self.durable
    }

    pub fn auto_delete(&self) -> bool {
        self.auto_delete
    }

    pub fn internal(&self) -> bool {
        self.internal
    }

    pub fn no_wait(&self) -> bool {
        self.no_wait
    }

    pub fn arguments(&self) -> &FieldTable {
        &self.arguments
    }
}

impl Request for DeclareRequest {
    const OPERATION: Operation = Operation::Declare;

    fn no_wait(&self) -> bool {
        self.no_wait
    }

    fn target(&self) -> String {
        self.name.clone()
    }
}

impl From<DeclareRequest> for Method {
    fn from(req: DeclareRequest) -> Self {
        Method::Declare(req)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    name: String,
    if_unused: bool,
    no_wait: bool,
}

impl DeleteRequest {
    pub fn build(name: &str, options: DeleteOptions) -> Result<Self> {
        check_short_str("exchange", name)?;

        Ok(Self {
            name: name.to_string(),
            if_unused: options.if_unused,
            no_wait: options.no_wait,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn if_unused(&self) -> bool {
        self.if_unused
    }

    pub fn no_wait(&self) -> bool {
        self.no_wait
    }
}

impl Request for DeleteRequest {
    const OPERATION: Operation = Operation::Delete;

    fn no_wait(&self) -> bool {
        self.no_wait
    }

    fn target(&self) -> String {
        self.name.clone()
    }
}

impl From<DeleteRequest> for Method {
    fn from(req: DeleteRequest) -> Self {
        Method::Delete(req)
    }
}

/// Fields common to bind and unbind.
#[derive(Debug, Clone, PartialEq)]
struct Binding {
    destination: String,
    source: String,
    routing_key: String,
    no_wait: bool,
    arguments: FieldTable,
}

impl Binding {
    fn build(destination: &str, source: &str, options: BindOptions) -> Result<Self> {
        check_short_str("destination", destination)?;
        check_short_str("source", source)?;
        check_short_str("routing_key", &options.routing_key)?;
        check_argument_keys(&options.arguments)?;

        Ok(Self {
            destination: destination.to_string(),
            source: source.to_string(),
            routing_key: options.routing_key,
            no_wait: options.no_wait,
            arguments: options.arguments,
        })
    }
}

macro_rules! binding_request {
    ($(#[$doc:meta])* $name:ident, $variant:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name(Binding);

        impl $name {
            pub fn build(destination: &str, source: &str, options: BindOptions) -> Result<Self> {
                Binding::build(destination, source, options).map(Self)
            }

            pub fn destination(&self) -> &str {
                &self.0.destination
            }

            pub fn source(&self) -> &str {
                &self.0.source
            }

            pub fn routing_key(&self) -> &str {
                &self.0.routing_key
            }

            pub fn no_wait(&self) -> bool {
                self.0.no_wait
            }

            pub fn arguments(&self) -> &FieldTable {
                &self.0.arguments
            }
        }

        impl Request for $name {
            const OPERATION: Operation = Operation::$variant;

            fn no_wait(&self) -> bool {
                self.0.no_wait
            }

            fn target(&self) -> String {
                format!("{} -> {}", self.0.source, self.0.destination)
            }
        }

        impl From<$name> for Method {
            fn from(req: $name) -> Self {
                Method::$variant(req)
            }
        }
    };
}

binding_request!(
    /// Routes messages from `source` to the `destination` exchange.
    BindRequest,
    Bind
);

binding_request!(
    /// Removes a binding previously created with the same fields.
    UnbindRequest,
    Unbind
);

fn check_argument_keys(arguments: &FieldTable) -> Result<()> {
    arguments
        .inner()
        .keys()
        .try_for_each(|key| check_short_str("arguments", key.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lapin::types::{AMQPValue, ShortString};

    #[test]
    fn declare_round_trips_inputs_and_defaults() {
        let req = DeclareRequest::build("orders", ExchangeType::Topic, DeclareOptions::default())
            .unwrap();

        assert_eq!(req.name(), "orders");
        assert_eq!(req.kind(), &ExchangeType::Topic);
        assert!(!req.durable());
        assert!(!req.auto_delete());
        assert!(!req.passive());
        assert!(!req.internal());
        assert!(!req.no_wait());
        assert!(req.arguments().inner().is_empty());
    }

    #[test]
    fn declare_keeps_every_option() {
        let options = DeclareOptions::default()
            .durable(true)
            .auto_delete(true)
            .passive(true)
            .internal(true)
            .no_wait(true)
            .argument("alternate-exchange", AMQPValue::Boolean(true));
        let req = DeclareRequest::build("audit", ExchangeType::Fanout, options).unwrap();

        assert!(req.durable() && req.auto_delete() && req.passive() && req.internal());
        assert!(req.no_wait());
        assert!(req
            .arguments()
            .inner()
            .contains_key(&ShortString::from("alternate-exchange".to_string())));
    }

    #[test]
    fn default_exchange_name_is_allowed() {
        let req = DeclareRequest::build("", ExchangeType::Direct, DeclareOptions::default());
        assert_eq!(req.unwrap().name(), "");
    }

    #[test]
    fn empty_custom_type_is_rejected() {
        let err = DeclareRequest::build("x", ExchangeType::Other(String::new()), Default::default())
            .unwrap_err();
        assert!(matches!(err, ExchangeError::InvalidOption { ref key, .. } if key == "type"));
    }

    #[test]
    fn long_names_are_rejected() {
        let name = "n".repeat(256);
        assert!(DeleteRequest::build(&name, DeleteOptions::default()).is_err());
        assert!(BindRequest::build(&name, "src", BindOptions::default()).is_err());
        assert!(UnbindRequest::build("dest", "src", BindOptions::default().routing_key(name)).is_err());
    }

    #[test]
    fn bind_defaults() {
        let req = BindRequest::build("dest", "src", BindOptions::default()).unwrap();
        assert_eq!(req.destination(), "dest");
        assert_eq!(req.source(), "src");
        assert_eq!(req.routing_key(), "");
        assert!(!req.no_wait());
        assert!(req.arguments().inner().is_empty());
    }

    #[test]
    fn delete_defaults() {
        let req = DeleteRequest::build("orders", DeleteOptions::default()).unwrap();
        assert_eq!(req.name(), "orders");
        assert!(!req.if_unused());
        assert!(!req.no_wait());
    }

    #[test]
    fn bindings_describe_source_and_destination() {
        let req = BindRequest::build("audit", "orders", BindOptions::default()).unwrap();
        assert_eq!(Request::target(&req), "orders -> audit");

        let req = DeleteRequest::build("orders", DeleteOptions::default()).unwrap();
        assert_eq!(Request::target(&req), "orders");
    }

    #[test]
    fn requests_map_to_their_confirmation() {
        assert_eq!(
            <DeclareRequest as Request>::OPERATION.confirmation(),
            Confirmation::DeclareOk
        );
        assert_eq!(
            <DeleteRequest as Request>::OPERATION.confirmation(),
            Confirmation::DeleteOk
        );
        assert_eq!(<BindRequest as Request>::OPERATION.confirmation(), Confirmation::BindOk);
        assert_eq!(
            <UnbindRequest as Request>::OPERATION.confirmation(),
            Confirmation::UnbindOk
        );
    }
}
