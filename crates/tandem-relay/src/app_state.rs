//! Shared application state for the relay.

use std::sync::Arc;

use crate::admin::AdminHub;
use crate::config::RelayConfig;
use crate::connections::ConnectionRegistry;
use crate::pairing::Matchmaker;
use crate::relay::Relay;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: RelayConfig,
    connections: Arc<ConnectionRegistry>,
    matchmaker: Arc<Matchmaker>,
    admin: Arc<AdminHub>,
    relay: Relay,
}

impl AppState {
    pub fn new(cfg: RelayConfig) -> Self {
        let connections = Arc::new(ConnectionRegistry::new());
        let matchmaker = Arc::new(Matchmaker::new());
        let admin = Arc::new(AdminHub::new());
        let relay = Relay::new(
            Arc::clone(&connections),
            Arc::clone(&matchmaker),
            Arc::clone(&admin),
        );

        Self {
            inner: Arc::new(AppStateInner { cfg, connections, matchmaker, admin, relay }),
        }
    }

    pub fn cfg(&self) -> &RelayConfig {
        &self.inner.cfg
    }

    pub fn connections(&self) -> &ConnectionRegistry {
        &self.inner.connections
    }

    pub fn matchmaker(&self) -> &Matchmaker {
        &self.inner.matchmaker
    }

    pub fn admin_hub(&self) -> &AdminHub {
        &self.inner.admin
    }

    pub fn relay(&self) -> &Relay {
        &self.inner.relay
    }
}
