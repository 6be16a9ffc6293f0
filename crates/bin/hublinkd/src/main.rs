//! # hublinkd: hublink driver daemon
//!
//! Composition root that wires all adapters together and keeps both hub
//! channels open.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialise logging
//! - Construct the hub client and check the hub version
//! - Construct the event bus and object registry
//! - Start the action channel and the configuration channel, each under a
//!   reconnect supervisor
//! - Register the driver's objects
//! - Handle graceful shutdown (Ctrl-C): close the configuration channel,
//!   then stop
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;
mod driver;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use hublink_adapter_hub_reqwest::ReqwestHubClient;
use hublink_adapter_ws_tungstenite::{ActionListener, CLOSE_TIMEOUT, ConfigListener, Reconnect};
use hublink_app::event_bus::EventBus;
use hublink_app::ports::HubClient;
use hublink_app::registry::ObjectRegistry;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    tracing::info!(host = %config.hub.host, driver_id = %config.driver.driver_id, "starting hublinkd");

    // Hub client, bus, registry
    let hub: Arc<dyn HubClient> =
        Arc::new(ReqwestHubClient::new(&config.hub_client()).context("building hub client")?);
    check_hub_version(hub.as_ref()).await?;
    let bus = Arc::new(EventBus::new());
    let registry = Arc::new(ObjectRegistry::new(
        Arc::clone(&hub),
        Arc::clone(&bus),
        config.dispatch_options(),
    ));
    registry.listen();

    // Action channel: created before registration so it sees every domain.
    let action_listener = Arc::new(ActionListener::new(config.action_channel(), Arc::clone(&bus)));
    let action_task = tokio::spawn({
        let listener = Arc::clone(&action_listener);
        let reconnect = Reconnect::new("action", config.reconnect);
        async move { reconnect.run(|| listener.run_session()).await }
    });

    // Configuration channel
    let handlers = Arc::new(driver::config_handlers(
        config.driver.event_catalogue().context("loading event catalogue")?,
    ));
    let config_listener = ConfigListener::new(config.config_channel(), handlers).with_video_engine_setter(
        Arc::new(|video_engine: String| {
            tracing::info!(%video_engine, "video engine assigned");
        }),
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let config_task = tokio::spawn({
        let reconnect = Reconnect::new("configuration", config.reconnect);
        async move {
            reconnect
                .run(|| config_listener.run_until(shutdown_requested(shutdown_rx.clone())))
                .await;
        }
    });

    // Objects
    for object in driver::objects(&config.driver.driver_id, "1")? {
        let object_id = object.metadata().object_id;
        if let Err(err) = registry.register_object(object).await {
            tracing::error!(%object_id, error = %err, "failed to register object");
        }
    }
    tracing::info!(objects = registry.len(), domains = ?registry.domains(), "driver ready");

    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
    tracing::info!("shutting down");

    let _ = shutdown_tx.send(true);
    if tokio::time::timeout(CLOSE_TIMEOUT + Duration::from_secs(1), config_task)
        .await
        .is_err()
    {
        tracing::warn!("configuration channel did not close in time");
    }
    action_task.abort();
    Ok(())
}

/// Refuse to start against a hub older than 2.0.0. An unreachable hub is
/// only logged; the channel supervisors keep retrying it.
async fn check_hub_version(hub: &dyn HubClient) -> anyhow::Result<()> {
    match hub.hub_version().await {
        Ok(version) => {
            version.ensure_supported()?;
            tracing::info!(version = %version.version, "hub version accepted");
        }
        Err(err) => tracing::warn!(error = %err, "could not read hub version"),
    }
    Ok(())
}

/// Resolves once shutdown was requested or the sender is gone.
async fn shutdown_requested(mut shutdown: watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|requested| *requested).await;
}
