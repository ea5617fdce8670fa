use log::debug;
use reqwest::Client;
use url::Url;

use super::FetchError;
use crate::settings::Upstream;

pub struct UpstreamClient {
    inner: Client,
    url: Url,
}

impl UpstreamClient {
    pub fn new(inner: Client, url: Url) -> Self {
        UpstreamClient { inner, url }
    }

    pub fn from_settings(settings: &Upstream) -> reqwest::Result<Self> {
        let inner = Client::builder().timeout(settings.timeout).build()?;

        Ok(UpstreamClient::new(inner, settings.url.clone()))
    }

    /// Any transport error or non-2xx status fails the whole fetch.
    pub async fn fetch_playlist(&self) -> Result<String, FetchError> {
        debug!("upstream playlist url: {}", self.url);

        let response = self
            .inner
            .get(self.url.clone())
            .send()
            .await
            .map_err(|source| self.request_error(source))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status,
            });
        }

        response
            .text()
            .await
            .map_err(|source| self.request_error(source))
    }

    fn request_error(&self, source: reqwest::Error) -> FetchError {
        FetchError::Request {
            url: self.url.clone(),
            source,
        }
    }
}
