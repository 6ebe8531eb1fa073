use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::{Error, Result};

/// Anything that can produce the raw HTML of a results page.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, page_num: u32) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub endpoint: Url,
    pub user_agent: String,
    pub timeout: Duration,
}

/// Requests registry result pages with a fixed browser identity.
/// No retries happen here, see [`crate::retry::Retrying`].
#[derive(Debug, Clone)]
pub struct PageFetcher {
    // Client uses Arc so we can clone cheaply
    client: Client,
    endpoint: Url,
}

impl PageFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn page_url(&self, page_num: u32) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("page", &page_num.to_string());
        url
    }
}

#[async_trait]
impl Fetch for PageFetcher {
    /// Requests a page and returns a `Result<String>` containing the HTML.
    async fn fetch(&self, page_num: u32) -> Result<String> {
        let url = self.page_url(page_num);
        debug!(page = page_num, %url, "requesting page");

        let res = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| Error::network(page_num, &e))?;

        let html = res.text().await.map_err(|e| Error::network(page_num, &e))?;
        Ok(html)
    }
}
