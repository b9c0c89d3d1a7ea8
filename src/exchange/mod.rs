// src/exchange/mod.rs
// Declaring, deleting, binding and unbinding exchanges over an open channel.

pub mod dispatch;
pub mod kind;
pub mod options;
pub mod request;

use tracing::instrument;

use crate::rabbitmq::channel::ExchangeChannel;
use crate::rabbitmq::errors::Result;

pub use dispatch::{call, check_reply, Expectation, Outcome};
pub use kind::ExchangeType;
pub use options::{arguments_from_json, BindOptions, DeclareOptions, DeleteOptions};
pub use request::{BindRequest, DeclareRequest, DeleteRequest, Operation, Request, UnbindRequest};

/// Declares `name` with the given type. Nothing reaches the channel if the
/// options fail validation.
#[instrument(skip(channel, options))]
pub async fn declare<C>(
    channel: &mut C,
    name: &str,
    kind: ExchangeType,
    options: DeclareOptions,
) -> Result<Outcome>
where
    C: ExchangeChannel + ?Sized,
{
    let request = DeclareRequest::build(name, kind, options)?;
    call(channel, request).await
}

#[instrument(skip(channel))]
pub async fn delete<C>(channel: &mut C, name: &str, options: DeleteOptions) -> Result<Outcome>
where
    C: ExchangeChannel + ?Sized,
{
    let request = DeleteRequest::build(name, options)?;
    call(channel, request).await
}

#[instrument(skip(channel, options))]
pub async fn bind<C>(
    channel: &mut C,
    destination: &str,
    source: &str,
    options: BindOptions,
) -> Result<Outcome>
where
    C: ExchangeChannel + ?Sized,
{
    let request = BindRequest::build(destination, source, options)?;
    call(channel, request).await
}

#[instrument(skip(channel, options))]
pub async fn unbind<C>(
    channel: &mut C,
    destination: &str,
    source: &str,
    options: BindOptions,
) -> Result<Outcome>
where
    C: ExchangeChannel + ?Sized,
{
    let request = UnbindRequest::build(destination, source, options)?;
    call(channel, request).await
}

pub async fn direct<C>(channel: &mut C, name: &str, options: DeclareOptions) -> Result<Outcome>
where
    C: ExchangeChannel + ?Sized,
{
    declare(channel, name, ExchangeType::Direct, options).await
}

pub async fn fanout<C>(channel: &mut C, name: &str, options: DeclareOptions) -> Result<Outcome>
where
    C: ExchangeChannel + ?Sized,
{
    declare(channel, name, ExchangeType::Fanout, options).await
}

pub async fn topic<C>(channel: &mut C, name: &str, options: DeclareOptions) -> Result<Outcome>
where
    C: ExchangeChannel + ?Sized,
{
    declare(channel, name, ExchangeType::Topic, options).await
}

pub async fn headers<C>(channel: &mut C, name: &str, options: DeclareOptions) -> Result<Outcome>
where
    C: ExchangeChannel + ?Sized,
{
    declare(channel, name, ExchangeType::Headers, options).await
}

/// Checks that `name` exists without creating it. The broker closes the
/// channel with 404 if it does not.
pub async fn declare_passive<C>(channel: &mut C, name: &str) -> Result<Outcome>
where
    C: ExchangeChannel + ?Sized,
{
    declare(
        channel,
        name,
        ExchangeType::default(),
        DeclareOptions::default().passive(true),
    )
    .await
}
