//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and only reach the outside world
//! through the services and ports it carries, so they stay testable with the
//! in-memory adapters.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::{CollectionService, IntegrationGateway, SystemTag};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Collection use cases.
    pub items: CollectionService,
    /// Process-wide gateway; handlers narrow it to the caller with
    /// [`IntegrationGateway::with_auth`].
    pub gateway: IntegrationGateway,
    /// Stamps exchange payloads.
    pub clock: Arc<dyn Clock>,
    /// Tag this service signs outgoing payloads with.
    pub source: SystemTag,
}

impl HttpState {
    /// Bundle the handler dependencies.
    pub fn new(
        items: CollectionService,
        gateway: IntegrationGateway,
        clock: Arc<dyn Clock>,
        source: SystemTag,
    ) -> Self {
        Self {
            items,
            gateway,
            clock,
            source,
        }
    }
}
