// src/api/transport.rs — Default HTTP transport (reqwest)
//
// GET {base_url}/api/{version}/user/{account_key}/{resource}[/{args}]

use async_trait::async_trait;
use url::Url;

use super::{ResourcePath, Transport};
use crate::infra::config::ApiConfig;
use crate::infra::errors::WkError;

pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(config: &ApiConfig) -> Result<Self, WkError> {
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let endpoint = Url::parse(&base)
            .and_then(|b| b.join(&format!("api/{}/user/", config.api_version)))
            .map_err(|e| WkError::Config(format!("invalid api.base_url '{}': {e}", config.base_url)))?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("wkcache/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub fn url_for(&self, path: &ResourcePath) -> Result<Url, WkError> {
        self.endpoint
            .join(&path.to_string())
            .map_err(|e| WkError::Config(format!("cannot build URL for {}: {e}", path.resource)))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, path: &ResourcePath) -> Result<serde_json::Value, WkError> {
        let url = self.url_for(path)?;
        // The account key is a credential; keep it out of the logs.
        tracing::info!("GET {} [{}]", path.resource, path.csv_args());

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WkError::Status {
                status: status.as_u16(),
                path: path.resource.as_str().to_string(),
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| WkError::malformed(path.resource.as_str(), e.to_string()))
    }
}
