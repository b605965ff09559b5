use std::collections::BTreeMap;
use std::sync::Arc;
use swap_engine_types::ProviderId;

use crate::SwapProvider;

/// Explicit registration table from provider identity to adapter
#[derive(Clone, Default)]
pub struct ProviderTable {
    adapters: BTreeMap<ProviderId, Arc<dyn SwapProvider>>,
}

impl ProviderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own id, replacing any previous one
    pub fn register(&mut self, adapter: Arc<dyn SwapProvider>) {
        self.adapters.insert(adapter.id(), adapter);
    }

    pub fn with(mut self, adapter: Arc<dyn SwapProvider>) -> Self {
        self.register(adapter);
        self
    }

    pub fn get(&self, id: ProviderId) -> Option<Arc<dyn SwapProvider>> {
        self.adapters.get(&id).cloned()
    }

    pub fn ids(&self) -> impl Iterator<Item = ProviderId> + '_ {
        self.adapters.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
