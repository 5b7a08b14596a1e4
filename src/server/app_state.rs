use std::sync::Arc;

use crate::config::Config;
use crate::room::registry::RoomRegistry;
use crate::transport::TransportFactory;

/// Top-level application state.
pub struct AppState {
    pub registry: RoomRegistry,
    pub transports: Arc<dyn TransportFactory>,
    pub config: Config,
}

impl AppState {
    pub fn new(
        registry: RoomRegistry,
        transports: Arc<dyn TransportFactory>,
        config: Config,
    ) -> Self {
        Self {
            registry,
            transports,
            config,
        }
    }
}
