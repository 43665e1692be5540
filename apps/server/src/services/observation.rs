//! Observation service - presents both reading tables as one Observation type.
//!
//! A search fans out to each reading table the `code` parameter leaves in
//! play, maps every row through its source's mapper and merges the results
//! into one list ordered by effective date, then source (blood pressure
//! first), then row id.

use crate::{
    db::ClinicalStore,
    mapping::to_observation_resource,
    models::{Observation, ObservationId, Reading},
    search::{build_observation_query, SearchParams},
    Error, Result,
};
use std::sync::Arc;

pub struct ObservationService {
    store: Arc<dyn ClinicalStore>,
}

impl ObservationService {
    pub fn new(store: Arc<dyn ClinicalStore>) -> Self {
        Self { store }
    }

    pub async fn search(&self, params: &SearchParams) -> Result<Vec<Observation>> {
        let query = build_observation_query(params)?;

        let mut readings = self.store.fetch_readings(&query).await?;
        readings.sort_by_key(Reading::sort_key);

        tracing::debug!(
            sources = ?query.sources,
            matches = readings.len(),
            "Observation search completed"
        );
        Ok(readings.iter().map(to_observation_resource).collect())
    }

    /// Read by composite id (`bp-<row id>` / `hr-<row id>`).
    pub async fn get(&self, id: &str) -> Result<Observation> {
        let observation_id: ObservationId = id.parse().map_err(|e: String| {
            tracing::debug!(id, reason = %e, "Unresolvable Observation id");
            Error::not_found("Observation", id)
        })?;

        self.store
            .get_reading(observation_id)
            .await?
            .map(|reading| to_observation_resource(&reading))
            .ok_or_else(|| Error::not_found("Observation", id))
    }
}
