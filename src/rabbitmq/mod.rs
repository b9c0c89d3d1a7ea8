// src/rabbitmq/mod.rs
// The broker side of the boundary: the channel collaborator and its errors.

pub mod amqp_client;
pub mod channel;
pub mod errors;

// Re-export specific items to simplify imports elsewhere
pub use amqp_client::RabbitMqClient;
pub use channel::{Confirmation, ExchangeChannel, Method, Reply};
pub use errors::{BrokerClose, ChannelFault, ExchangeError, FaultDetail, Result};
