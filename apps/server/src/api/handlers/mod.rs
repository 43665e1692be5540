pub mod health;
pub mod metadata;
pub mod observation;
pub mod patient;

use crate::{config::Config, search::SearchParams, Error, Result};
use axum::extract::{rejection::QueryRejection, Query};

pub type RawSearchQuery = std::result::Result<Query<Vec<(String, String)>>, QueryRejection>;

/// Collect query-string pairs, reporting an undecodable query string as a
/// search parameter error.
pub(crate) fn search_params(query: RawSearchQuery) -> Result<SearchParams> {
    let Query(pairs) = query.map_err(|e| Error::InvalidSearchParameter(e.body_text()))?;
    Ok(SearchParams::from(pairs))
}

/// `Bundle.entry.fullUrl` for a resource.
pub(crate) fn full_url(config: &Config, resource_type: &str, id: &str) -> String {
    match config.public_base_url() {
        Some(base) => format!("{base}/{resource_type}/{id}"),
        None => format!("{resource_type}/{id}"),
    }
}
