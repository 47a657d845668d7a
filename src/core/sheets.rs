use crate::core::import::state_from_csv;
use crate::domain::model::ConfigState;
use crate::domain::ports::CsvSource;
use crate::utils::error::{CatalogError, Result};
use crate::utils::validation::validate_url;
use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::Client;

/// Published Google Sheets CSV over HTTP.
pub struct HttpCsvSource {
    client: Client,
}

impl HttpCsvSource {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for HttpCsvSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CsvSource for HttpCsvSource {
    async fn fetch_csv(&self, source_name: &str, url: &str) -> Result<String> {
        tracing::debug!("Fetching {} CSV from: {}", source_name, url);
        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .await?;

        tracing::debug!("{} response status: {}", source_name, response.status());
        if !response.status().is_success() {
            return Err(CatalogError::FetchError {
                source_name: source_name.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

/// Downloads both sheets concurrently and builds a fresh state from them.
/// Either fetch failing fails the whole import; nothing is returned to
/// overwrite the caller's state in that case.
pub async fn import_from_sheets<C: CsvSource + ?Sized>(
    source: &C,
    services_url: &str,
    categories_url: &str,
) -> Result<ConfigState> {
    let services_url = services_url.trim();
    let categories_url = categories_url.trim();
    validate_url("import.services_url", services_url)?;
    validate_url("import.categories_url", categories_url)?;

    let (services_csv, categories_csv) = tokio::try_join!(
        source.fetch_csv("services", services_url),
        source.fetch_csv("categories", categories_url),
    )?;

    let state = state_from_csv(&categories_csv, &services_csv)?;
    tracing::info!(
        "Imported {} primaries and {} services from published sheets",
        state.primaries.len(),
        state.services.len()
    );
    Ok(state)
}
