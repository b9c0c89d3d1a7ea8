// src/config.rs
// Declarative exchange topology loaded from JSON and applied over a channel.
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::exchange::{
    self, BindOptions, BindRequest, DeclareOptions, DeclareRequest, DeleteOptions, DeleteRequest,
    ExchangeType, Outcome, Request, UnbindRequest,
};
use crate::rabbitmq::channel::ExchangeChannel;
use crate::rabbitmq::errors::Result as ExchangeResult;

pub const CONFIG_FILE_NAME: &str = "exchange_topology.json";

// Configuration structures
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopologyConfig {
    #[serde(default)]
    pub exchanges: Vec<ExchangeConfig>,
    #[serde(default)]
    pub bindings: Vec<BindingConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExchangeConfig {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: ExchangeType,
    #[serde(default)]
    pub options: DeclareOptions,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindingConfig {
    pub destination: String,
    pub source: String,
    #[serde(default)]
    pub options: BindOptions,
}

impl ExchangeConfig {
    fn declare_request(&self) -> ExchangeResult<DeclareRequest> {
        DeclareRequest::build(&self.name, self.kind.clone(), self.options.clone())
    }
}

impl TopologyConfig {
    /// Builds every declare request, failing on the first invalid entry.
    pub fn declarations(&self) -> ExchangeResult<Vec<DeclareRequest>> {
        self.exchanges.iter().map(ExchangeConfig::declare_request).collect()
    }

    pub fn binds(&self) -> ExchangeResult<Vec<BindRequest>> {
        self.bindings
            .iter()
            .map(|b| BindRequest::build(&b.destination, &b.source, b.options.clone()))
            .collect()
    }

    pub fn unbinds(&self) -> ExchangeResult<Vec<UnbindRequest>> {
        self.bindings
            .iter()
            .map(|b| UnbindRequest::build(&b.destination, &b.source, b.options.clone()))
            .collect()
    }

    pub fn deletions(&self) -> ExchangeResult<Vec<DeleteRequest>> {
        self.exchanges
            .iter()
            .map(|e| DeleteRequest::build(&e.name, DeleteOptions::default()))
            .collect()
    }

    pub fn validate(&self) -> ExchangeResult<()> {
        self.declarations()?;
        self.binds()?;
        Ok(())
    }
}

// Configuration loading and management functions
pub fn find_config_file() -> Result<PathBuf> {
    // Check various locations
    let locations = [
        ("Current directory", PathBuf::from(CONFIG_FILE_NAME)),
        (
            "Current directory (config/)",
            Path::new("config").join(CONFIG_FILE_NAME),
        ),
    ];

    for (location_name, path) in locations.iter() {
        if path.exists() {
            debug!("Found topology file in {}: {}", location_name, path.display());
            return Ok(path.clone());
        }
    }

    // Try the user's home directory
    if let Some(home_dir) = home::home_dir() {
        let home_config = home_dir.join(format!(".{}", CONFIG_FILE_NAME));
        if home_config.exists() {
            debug!("Found topology file in home directory: {}", home_config.display());
            return Ok(home_config);
        }
    }

    Err(anyhow!(
        "Could not find {} in the current directory, config/, or your home directory",
        CONFIG_FILE_NAME
    ))
}

pub fn parse_config(content: &str) -> Result<TopologyConfig> {
    let config: TopologyConfig = serde_json::from_str(content)
        .context("Topology file contains invalid JSON, unknown fields or malformed options")?;

    config
        .validate()
        .context("Topology file contains invalid exchange options")?;

    Ok(config)
}

pub fn load_config(path: &Path) -> Result<TopologyConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read topology file at {}", path.display()))?;
    let config = parse_config(&content)?;
    info!(
        path = %path.display(),
        exchanges = config.exchanges.len(),
        bindings = config.bindings.len(),
        "Loaded exchange topology"
    );
    Ok(config)
}

/// Declares every exchange, then creates every binding, in file order.
///
/// All requests are built up front so an invalid entry never leaves the
/// broker half configured. The first failing call stops the run; its error
/// names the exchange or binding it addressed.
pub async fn apply<C>(channel: &mut C, config: &TopologyConfig) -> ExchangeResult<Vec<Outcome>>
where
    C: ExchangeChannel + ?Sized,
{
    let declarations = config.declarations()?;
    let binds = config.binds()?;
    let mut outcomes = Vec::with_capacity(declarations.len() + binds.len());

    send_all(channel, declarations, &mut outcomes).await?;
    send_all(channel, binds, &mut outcomes).await?;

    info!(calls = outcomes.len(), "Exchange topology applied");
    Ok(outcomes)
}

/// Undoes [`apply`]: unbinds in reverse order, then deletes in reverse order.
pub async fn teardown<C>(channel: &mut C, config: &TopologyConfig) -> ExchangeResult<Vec<Outcome>>
where
    C: ExchangeChannel + ?Sized,
{
    let unbinds = config.unbinds()?;
    let deletions = config.deletions()?;
    let mut outcomes = Vec::with_capacity(unbinds.len() + deletions.len());

    send_all(channel, unbinds.into_iter().rev(), &mut outcomes).await?;
    send_all(channel, deletions.into_iter().rev(), &mut outcomes).await?;

    info!(calls = outcomes.len(), "Exchange topology removed");
    Ok(outcomes)
}

async fn send_all<C, R, I>(
    channel: &mut C,
    requests: I,
    outcomes: &mut Vec<Outcome>,
) -> ExchangeResult<()>
where
    C: ExchangeChannel + ?Sized,
    R: Request,
    I: IntoIterator<Item = R>,
{
    for request in requests {
        match exchange::call(channel, request).await {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                error!(
                    operation = R::OPERATION.as_str(),
                    completed = outcomes.len(),
                    error = %e,
                    "Topology change stopped"
                );
                return Err(e);
            }
        }
    }
    Ok(())
}
