//! reqwest-backed [`GenerationClient`].

use super::{ClientError, ClientResult, GenerationClient, GenerationRequest, Prediction};
use crate::BoxFuture;
use crate::config::{ConfigResult, StudioConfig};
use url::Url;

/// Talks to a generation endpoint over HTTP.
///
/// Requests are POSTed as JSON. Poll URLs are fetched with GET; relative
/// poll URLs resolve against the endpoint.
#[derive(Debug, Clone)]
pub struct HttpGenerationClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpGenerationClient {
    pub fn new(endpoint: &str) -> ClientResult<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: Url::parse(endpoint)?,
        })
    }

    pub fn from_config(config: &StudioConfig) -> ConfigResult<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint_url()?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn resolve(&self, url: &str) -> ClientResult<Url> {
        Ok(self.endpoint.join(url)?)
    }

    async fn read(response: reqwest::Response) -> ClientResult<Prediction> {
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }
        Ok(response.json::<Prediction>().await?)
    }
}

impl GenerationClient for HttpGenerationClient {
    fn submit<'a>(&'a self, request: &'a GenerationRequest) -> BoxFuture<'a, ClientResult<Prediction>> {
        Box::pin(async move {
            log::debug!("POST {}", self.endpoint);
            let response = self
                .client
                .post(self.endpoint.clone())
                .json(request)
                .send()
                .await?;
            Self::read(response).await
        })
    }

    fn poll<'a>(&'a self, url: &'a str) -> BoxFuture<'a, ClientResult<Prediction>> {
        Box::pin(async move {
            let url = self.resolve(url)?;
            log::debug!("GET {}", url);
            let response = self.client.get(url).send().await?;
            Self::read(response).await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_poll_url() {
        let client = HttpGenerationClient::new("http://127.0.0.1:3030/api/generate-design").unwrap();
        assert_eq!(
            client.resolve("/api/predictions/abc").unwrap().as_str(),
            "http://127.0.0.1:3030/api/predictions/abc"
        );
        assert_eq!(
            client.resolve("https://api.replicate.com/v1/predictions/abc").unwrap().as_str(),
            "https://api.replicate.com/v1/predictions/abc"
        );
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(matches!(
            HttpGenerationClient::new("::nope"),
            Err(ClientError::Url(_))
        ));
    }

    #[test]
    fn test_from_config() {
        let client = HttpGenerationClient::from_config(&StudioConfig::default()).unwrap();
        assert_eq!(client.endpoint().path(), "/api/generate-design");
    }
}
