//! Per-item-type hooks for the external artifacts under review

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use super::item_type::ItemType;
use crate::domain::DomainError;

/// Validates that a reviewable item exists before a workflow is created for it
#[async_trait]
pub trait ItemResolver: Send + Sync {
    /// `NotFound` if the item is unknown to its owning module
    async fn ensure_exists(&self, item_id: &str, engagement: &str) -> Result<(), DomainError>;
}

/// Resolver for item types whose owning module exposes no lookup
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAllResolver;

#[async_trait]
impl ItemResolver for AcceptAllResolver {
    async fn ensure_exists(&self, item_id: &str, _engagement: &str) -> Result<(), DomainError> {
        if item_id.trim().is_empty() {
            return Err(DomainError::validation("Item ID cannot be empty"));
        }

        Ok(())
    }
}

/// Dispatch table from item type to its resolver
#[derive(Clone)]
pub struct ItemRegistry {
    resolvers: HashMap<ItemType, Arc<dyn ItemResolver>>,
    fallback: Arc<dyn ItemResolver>,
}

impl std::fmt::Debug for ItemRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemRegistry")
            .field("registered", &self.resolvers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for ItemRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemRegistry {
    pub fn new() -> Self {
        Self {
            resolvers: HashMap::new(),
            fallback: Arc::new(AcceptAllResolver),
        }
    }

    pub fn with_resolver(mut self, item_type: ItemType, resolver: Arc<dyn ItemResolver>) -> Self {
        self.resolvers.insert(item_type, resolver);
        self
    }

    pub fn resolver(&self, item_type: ItemType) -> &dyn ItemResolver {
        self.resolvers
            .get(&item_type)
            .map(|r| r.as_ref())
            .unwrap_or(self.fallback.as_ref())
    }

    pub async fn ensure_exists(
        &self,
        item_type: ItemType,
        item_id: &str,
        engagement: &str,
    ) -> Result<(), DomainError> {
        self.resolver(item_type)
            .ensure_exists(item_id, engagement)
            .await
    }
}
