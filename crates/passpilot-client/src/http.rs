//! HTTP pass source backed by the PassPilot REST API

use async_trait::async_trait;
use passpilot_api::{Pass, School};
use passpilot_util::SchoolId;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{PassSource, SourceError, SourceResult};

/// List endpoints answer either with a bare array or with an envelope.
///
/// Items stay raw so each record is decoded on its own.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListBody {
    Bare(Vec<Value>),
    Wrapped {
        #[serde(alias = "passes")]
        data: Vec<Value>,
    },
}

impl ListBody {
    fn into_items(self) -> Vec<Value> {
        match self {
            ListBody::Bare(items) => items,
            ListBody::Wrapped { data } => data,
        }
    }

    /// Decode every item as `T`, dropping (and logging) the ones that do not fit
    fn decode<T: DeserializeOwned>(self, url: &Url) -> Vec<T> {
        self.into_items()
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(url = %url, index, error = %e, "Skipping malformed record");
                    None
                }
            })
            .collect()
    }
}

/// [`PassSource`] talking JSON over HTTP
///
/// Endpoints, relative to the base URL:
/// - `GET api/schools/{id}/passes/active`
/// - `GET api/schools/{id}/passes`
/// - `GET api/schools/{id}`
#[derive(Debug, Clone)]
pub struct HttpPassSource {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpPassSource {
    /// Create a source with its own client using `timeout` for connect and request
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> SourceResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Self::from_reqwest(base_url, client, token)
    }

    /// Create a source around an existing client
    pub fn from_reqwest(base_url: &str, client: Client, token: Option<String>) -> SourceResult<Self> {
        let base_url =
            Url::parse(base_url).map_err(|_| SourceError::InvalidUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(SourceError::InvalidUrl(base_url.to_string()));
        }

        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> SourceResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> SourceResult<T> {
        debug!(url = %url, "Fetching");

        let mut request = self.client.get(url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(url = %url, status = %status, "Response received");

        match status {
            s if s.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(SourceError::Unauthorized(url.to_string()));
            }
            StatusCode::NOT_FOUND => return Err(SourceError::NotFound(url.to_string())),
            other => {
                return Err(SourceError::Status {
                    status: other.as_u16(),
                    url: url.to_string(),
                });
            }
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| SourceError::Decode(e.to_string()))
    }
}

#[async_trait]
impl PassSource for HttpPassSource {
    async fn fetch_active_passes(&self, scope: &SchoolId) -> SourceResult<Vec<Pass>> {
        let url = self.endpoint(&["api", "schools", scope.as_str(), "passes", "active"])?;
        let body: ListBody = self.get_json(url.clone()).await?;
        Ok(body.decode(&url))
    }

    async fn fetch_school(&self, scope: &SchoolId) -> SourceResult<School> {
        let url = self.endpoint(&["api", "schools", scope.as_str()])?;
        self.get_json(url).await
    }

    async fn fetch_passes(&self, scope: &SchoolId) -> SourceResult<Vec<Pass>> {
        let url = self.endpoint(&["api", "schools", scope.as_str(), "passes"])?;
        let body: ListBody = self.get_json(url.clone()).await?;
        Ok(body.decode(&url))
    }
}
