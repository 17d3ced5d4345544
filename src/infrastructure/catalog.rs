//! # Catalog Service Adapter
//!
//! Implements the [`Catalog`] trait against the aquapark booking gateway:
//! current occupancy, bookable sessions for a date, and tariffs for a date.
//! Pure request/response; retries are the caller's business.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::config::CatalogConfig;
use crate::domain::error::CatalogError;
use crate::domain::traits::Catalog;
use crate::domain::types::{LoadInfo, SessionOption, TariffRate};

pub struct CatalogClient {
    http: reqwest::Client,
    config: CatalogConfig,
}

impl CatalogClient {
    pub fn new(config: CatalogConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()
            .expect("failed to create HTTP client");
        Self { http, config }
    }

    async fn get_result_rows<T: serde::de::DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        date: &str,
    ) -> Result<Vec<T>, CatalogError> {
        let url = format!("{}/{path}", self.config.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("date", date)])
            .send()
            .await
            .map_err(|e| CatalogError::new(operation, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::new(operation, format!("HTTP {status}")));
        }

        let envelope: ResultEnvelope<T> = response
            .json()
            .await
            .map_err(|e| CatalogError::new(operation, format!("malformed body: {e}")))?;

        // An absent or empty `result` is a valid "nothing on offer" answer.
        Ok(envelope.result.unwrap_or_default())
    }
}

#[async_trait]
impl Catalog for CatalogClient {
    async fn current_load(&self) -> Result<LoadInfo, CatalogError> {
        let url = format!("{}/CurrentLoad", self.config.base_url);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "SiteID": self.config.site_id }))
            .send()
            .await
            .map_err(|e| CatalogError::new("current-load", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::new("current-load", format!("HTTP {status}")));
        }

        let body: LoadRow = response
            .json()
            .await
            .map_err(|e| CatalogError::new("current-load", format!("malformed body: {e}")))?;

        Ok(LoadInfo {
            count: body.count,
            load_percent: body.load,
        })
    }

    async fn sessions(&self, date: &str) -> Result<Vec<SessionOption>, CatalogError> {
        let rows: Vec<SessionRow> = self
            .get_result_rows("sessions", "getSessionsAqua", date)
            .await?;
        Ok(rows.into_iter().map(SessionRow::into_option).collect())
    }

    async fn tariffs(&self, date: &str) -> Result<Vec<TariffRate>, CatalogError> {
        let rows: Vec<TariffRow> = self
            .get_result_rows("tariffs", "getTariffsAqua", date)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| TariffRate {
                name: row.name,
                price: row.price,
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::Deserialize<'de>"))]
struct ResultEnvelope<T> {
    #[serde(default)]
    result: Option<Vec<T>>,
}

/// The gateway is inconsistent about casing, hence the aliases.
#[derive(Debug, Deserialize)]
struct LoadRow {
    #[serde(alias = "Count", default)]
    count: i64,
    #[serde(alias = "Load", default)]
    load: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionRow {
    #[serde(default)]
    start_time: String,
    #[serde(default)]
    end_time: String,
    #[serde(default)]
    available_count: i64,
    #[serde(default)]
    total_count: i64,
    #[serde(default)]
    session_time: Option<String>,
}

impl SessionRow {
    fn into_option(self) -> SessionOption {
        let label = self
            .session_time
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("{}-{}", self.start_time, self.end_time));
        SessionOption {
            label,
            start_time: self.start_time,
            end_time: self.end_time,
            free_seats: self.available_count,
            total_seats: self.total_count,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TariffRow {
    #[serde(alias = "Name", default)]
    name: String,
    #[serde(alias = "Price", default)]
    price: f64,
}
