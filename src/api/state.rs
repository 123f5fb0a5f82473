//! Application state shared by handlers

use std::sync::Arc;

use crate::infrastructure::auth::TokenValidator;
use crate::infrastructure::services::ReviewServiceTrait;
use crate::infrastructure::storage::StorageFactory;

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub review_service: Arc<dyn ReviewServiceTrait>,
    pub token_validator: Arc<dyn TokenValidator>,
    pub storage: StorageFactory,
}

impl AppState {
    pub fn new(
        review_service: Arc<dyn ReviewServiceTrait>,
        token_validator: Arc<dyn TokenValidator>,
        storage: StorageFactory,
    ) -> Self {
        Self {
            review_service,
            token_validator,
            storage,
        }
    }
}
