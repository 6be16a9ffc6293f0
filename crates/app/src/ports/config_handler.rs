//! Configuration handler port: answers one kind of configuration request.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use hublink_domain::config::DeviceData;
use hublink_domain::error::HubLinkError;

/// Answers configuration requests for one [`ConfigKey`](hublink_domain::config::ConfigKey).
///
/// The returned string is sent to the hub verbatim; an empty string or
/// `"null"` is replaced by a generic OK reply.
#[async_trait]
pub trait ConfigHandler: Send + Sync {
    async fn handle(
        &self,
        value: &str,
        device: Option<&DeviceData>,
    ) -> Result<String, HubLinkError>;
}

/// [`ConfigHandler`] backed by an async closure.
pub struct FnHandler<F>(F);

/// Wrap an async closure as a shareable [`ConfigHandler`].
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn ConfigHandler>
where
    F: Fn(String, Option<DeviceData>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, HubLinkError>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

#[async_trait]
impl<F, Fut> ConfigHandler for FnHandler<F>
where
    F: Fn(String, Option<DeviceData>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, HubLinkError>> + Send + 'static,
{
    async fn handle(
        &self,
        value: &str,
        device: Option<&DeviceData>,
    ) -> Result<String, HubLinkError> {
        (self.0)(value.to_string(), device.cloned()).await
    }
}
