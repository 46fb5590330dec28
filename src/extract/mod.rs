//! Extraction strategies turning product pages into records
//!
//! This module contains:
//! - The `ProductExtractor` capability implemented by every store strategy
//! - The `StrategyRegistry` dispatching a job to its store's strategy
//! - JSON-LD helpers shared by the built-in strategies
//!
//! New stores are supported by registering another `ProductExtractor`.

mod record;
mod stores;
pub mod structured;

pub use record::{Availability, ProductRecord, NAME_UNKNOWN, PRICE_NOT_AVAILABLE};
pub use stores::{builtin_strategies, heading_text, JsonLdStrategy, PriceStyle};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while extracting a product
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no extraction strategy registered for store type '{0}'")]
    UnknownStore(String),

    #[error("invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("extraction panicked: {0}")]
    Panicked(String),
}

/// Capability of turning one store's product page into a `ProductRecord`
///
/// Implementations must be pure: the same HTML and URL always yield the same
/// record, and no network access happens during extraction.
pub trait ProductExtractor: Send + Sync {
    /// Store identifier this strategy is registered under
    fn store(&self) -> &str;

    /// Extracts a product record from a fetched page
    fn extract(&self, html: &str, url: &str) -> Result<ProductRecord, ExtractError>;
}

/// Maps store identifiers to their extraction strategies
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    strategies: HashMap<String, Arc<dyn ProductExtractor>>,
}

impl StrategyRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in store strategies
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for strategy in builtin_strategies() {
            registry.register(strategy);
        }
        registry
    }

    /// Registers a strategy under its store identifier
    ///
    /// Returns the strategy previously registered for that store, if any.
    pub fn register(
        &mut self,
        strategy: Arc<dyn ProductExtractor>,
    ) -> Option<Arc<dyn ProductExtractor>> {
        self.strategies
            .insert(strategy.store().to_string(), strategy)
    }

    /// Looks up the strategy for a store
    pub fn get(&self, store: &str) -> Option<&Arc<dyn ProductExtractor>> {
        self.strategies.get(store)
    }

    /// Registered store identifiers, sorted
    pub fn stores(&self) -> Vec<&str> {
        let mut stores: Vec<&str> = self.strategies.keys().map(String::as_str).collect();
        stores.sort_unstable();
        stores
    }

    /// Runs the strategy registered for `store`
    ///
    /// # Returns
    ///
    /// * `Ok(ProductRecord)` - The extracted product
    /// * `Err(ExtractError::UnknownStore)` - No strategy is registered for the store
    /// * `Err(ExtractError)` - The strategy failed
    pub fn extract(
        &self,
        store: &str,
        html: &str,
        url: &str,
    ) -> Result<ProductRecord, ExtractError> {
        let strategy = self
            .get(store)
            .ok_or_else(|| ExtractError::UnknownStore(store.to_string()))?;
        strategy.extract(html, url)
    }
}

impl fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategyRegistry")
            .field("stores", &self.stores())
            .finish()
    }
}
