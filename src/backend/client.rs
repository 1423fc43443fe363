use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::core::{BackendConfig, BackendUnavailable, DataFetchError};

/// Handle to the hosted data service's REST interface.
///
/// Built once at startup from [`BackendConfig`] and shared as
/// `Arc<BackendClient>` with every data source and order placer.
#[derive(Debug)]
pub struct BackendClient {
    http: Client,
    base_url: Url,
    anon_key: String,
}

impl BackendClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendUnavailable> {
        if !config.is_configured() {
            return Err(BackendUnavailable::NotConfigured);
        }

        let base_url = Self::parse_base_url(&config.url)?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| BackendUnavailable::Client(e.to_string()))?;

        log::info!("Backend client ready for {}", base_url);
        Ok(Self {
            http,
            base_url,
            anon_key: config.anon_key.trim().to_string(),
        })
    }

    fn parse_base_url(raw: &str) -> Result<Url, BackendUnavailable> {
        let mut raw = raw.trim().to_string();
        // Url::join drops the last segment unless it ends with '/'
        if !raw.ends_with('/') {
            raw.push('/');
        }

        let url = Url::parse(&raw).map_err(|e| BackendUnavailable::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(BackendUnavailable::InvalidUrl {
                url: raw.clone(),
                reason: format!("unsupported scheme {}", other),
            }),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn table_url(&self, table: &str) -> Result<Url, DataFetchError> {
        self.base_url
            .join(&format!("rest/v1/{}", table))
            .map_err(|e| DataFetchError::Transport(format!("bad table path {}: {}", table, e)))
    }

    /// GET rows from `table` with PostgREST query parameters.
    pub fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<T, DataFetchError> {
        let url = self.table_url(table)?;
        log::debug!("GET {} {:?}", url, query);

        let response = self
            .http
            .get(url)
            .query(query)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .send()
            .map_err(|e| DataFetchError::Transport(e.to_string()))?;

        Self::decode(response)
    }

    /// POST one row into `table` and return the stored representation.
    pub fn insert<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        row: &B,
    ) -> Result<T, DataFetchError> {
        let url = self.table_url(table)?;
        log::debug!("POST {}", url);

        let response = self
            .http
            .post(url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
            .header("Prefer", "return=representation")
            .header("Accept", "application/vnd.pgrst.object+json")
            .json(row)
            .send()
            .map_err(|e| DataFetchError::Transport(e.to_string()))?;

        Self::decode(response)
    }

    fn decode<T: DeserializeOwned>(response: Response) -> Result<T, DataFetchError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(DataFetchError::Status { status: status.as_u16(), body });
        }
        response.json::<T>().map_err(|e| DataFetchError::Decode(e.to_string()))
    }
}
