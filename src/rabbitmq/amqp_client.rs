// src/rabbitmq/amqp_client.rs

use async_trait::async_trait;
use lapin::{
    options::{
        ExchangeBindOptions, ExchangeDeclareOptions, ExchangeDeleteOptions, ExchangeUnbindOptions,
    },
    Channel, Connection, ConnectionProperties,
};
use tracing::{debug, info};

use super::channel::{Confirmation, ExchangeChannel, Method, Reply};
use super::errors::ChannelFault;

// lapin reads the `*-ok` frame itself and only returns once it matches, or
// right after queueing the frame when `nowait` is set.
#[async_trait]
impl ExchangeChannel for Channel {
    async fn call(&mut self, method: Method) -> Result<Reply, ChannelFault> {
        let no_wait = method.no_wait();

        let confirmation = match method {
            Method::Declare(req) => {
                let options = ExchangeDeclareOptions {
                    passive: req.passive(),
                    durable: req.durable(),
                    auto_delete: req.auto_delete(),
                    internal: req.internal(),
                    nowait: req.no_wait(),
                };
                self.exchange_declare(
                    req.name(),
                    req.kind().clone().into(),
                    options,
                    req.arguments().clone(),
                )
                .await?;
                Confirmation::DeclareOk
            }
            Method::Delete(req) => {
                let options = ExchangeDeleteOptions {
                    if_unused: req.if_unused(),
                    nowait: req.no_wait(),
                };
                self.exchange_delete(req.name(), options).await?;
                Confirmation::DeleteOk
            }
            Method::Bind(req) => {
                let options = ExchangeBindOptions {
                    nowait: req.no_wait(),
                };
                self.exchange_bind(
                    req.destination(),
                    req.source(),
                    req.routing_key(),
                    options,
                    req.arguments().clone(),
                )
                .await?;
                Confirmation::BindOk
            }
            Method::Unbind(req) => {
                let options = ExchangeUnbindOptions {
                    nowait: req.no_wait(),
                };
                self.exchange_unbind(
                    req.destination(),
                    req.source(),
                    req.routing_key(),
                    options,
                    req.arguments().clone(),
                )
                .await?;
                Confirmation::UnbindOk
            }
        };

        if no_wait {
            Ok(Reply::Accepted)
        } else {
            Ok(Reply::Confirmed(confirmation))
        }
    }
}

/// Owns a lapin connection and the one channel used for topology changes.
pub struct RabbitMqClient {
    amqp_uri: String,
    connection: Option<Connection>,
    channel: Option<Channel>,
}

impl RabbitMqClient {
    pub fn new(amqp_uri: &str) -> Self {
        Self {
            amqp_uri: amqp_uri.to_string(),
            connection: None,
            channel: None,
        }
    }

    pub async fn ensure_connected(&mut self) -> Result<(), ChannelFault> {
        // Check if we already have a working channel
        if let Some(channel) = &self.channel {
            if channel.status().connected() {
                return Ok(());
            }
        }

        info!(uri = %self.amqp_uri, "Connecting to RabbitMQ");
        let connection = Connection::connect(&self.amqp_uri, ConnectionProperties::default())
            .await
            .map_err(|e| ChannelFault::Transport(format!("Failed to connect: {}", e)))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| ChannelFault::Transport(format!("Failed to create channel: {}", e)))?;
        debug!(channel_id = channel.id(), "Opened channel");

        self.connection = Some(connection);
        self.channel = Some(channel);

        Ok(())
    }

    /// The connected channel, opening one first if needed.
    pub async fn channel(&mut self) -> Result<&mut Channel, ChannelFault> {
        self.ensure_connected().await?;
        self.channel
            .as_mut()
            .ok_or_else(|| ChannelFault::Transport("Channel is not available".to_string()))
    }

    pub async fn close(&mut self) -> Result<(), ChannelFault> {
        if let Some(channel) = self.channel.take() {
            channel.close(200, "Closing exchange client").await?;
        }
        if let Some(connection) = self.connection.take() {
            info!("Closing RabbitMQ connection gracefully");
            connection.close(200, "Closing exchange client").await?;
        }
        Ok(())
    }
}
