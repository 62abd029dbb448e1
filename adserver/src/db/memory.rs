use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use primitives::Advertisement;

use crate::db::{AdRepository, RepositoryError};

/// In-memory [`AdRepository`] over a shared record vector.
///
/// Used by the handler tests and for running the API without a database.
#[derive(Debug, Clone, Default)]
pub struct MemoryAdRepository {
    records: Arc<RwLock<Vec<Advertisement>>>,
}

impl MemoryAdRepository {
    pub fn new(initial_ads: &[Advertisement]) -> Self {
        Self {
            records: Arc::new(RwLock::new(initial_ads.to_vec())),
        }
    }
}

#[async_trait]
impl AdRepository for MemoryAdRepository {
    async fn add(&self, ad: &Advertisement) -> Result<(), RepositoryError> {
        let mut writer = self
            .records
            .write()
            .map_err(|error| RepositoryError::Storage(error.to_string()))?;
        writer.push(ad.clone());

        Ok(())
    }

    async fn active(&self, now: DateTime<Utc>) -> Result<Vec<Advertisement>, RepositoryError> {
        let reader = self
            .records
            .read()
            .map_err(|error| RepositoryError::Storage(error.to_string()))?;

        Ok(reader
            .iter()
            .filter(|ad| ad.is_active(now))
            .cloned()
            .collect())
    }
}
