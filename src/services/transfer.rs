use crate::error::UploaderError;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;

/// Access to the remote archive over HTTP
#[async_trait]
pub trait TransferGateway: Send + Sync {
    /// Metadata-only HEAD request; non-success status or network failure is `Unreachable`.
    async fn check_reachable(&self, url: &str) -> Result<(), UploaderError>;

    /// Retrieves the full body; non-success status or network failure is `Fetch`.
    async fn fetch(&self, url: &str) -> Result<Bytes, UploaderError>;
}

pub struct HttpTransferService {
    client: Client,
}

impl HttpTransferService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TransferGateway for HttpTransferService {
    async fn check_reachable(&self, url: &str) -> Result<(), UploaderError> {
        let unreachable = |e: reqwest::Error| UploaderError::Unreachable {
            url: url.to_string(),
            source: e.into(),
        };

        let response = self.client.head(url).send().await.map_err(unreachable)?;
        response.error_for_status().map_err(unreachable)?;
        Ok(())
    }

    async fn fetch(&self, url: &str) -> Result<Bytes, UploaderError> {
        let fetch_failed = |e: reqwest::Error| UploaderError::Fetch {
            url: url.to_string(),
            source: e.into(),
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(fetch_failed)?
            .error_for_status()
            .map_err(fetch_failed)?;

        let body = response.bytes().await.map_err(fetch_failed)?;
        tracing::debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

/// Transfer gateway serving a fixed body, or failing every call (for testing)
#[cfg(test)]
pub struct StaticTransfer {
    pub body: Option<bytes::Bytes>,
    pub fetches: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
#[async_trait::async_trait]
impl TransferGateway for StaticTransfer {
    async fn check_reachable(&self, url: &str) -> Result<(), UploaderError> {
        match self.body {
            Some(_) => Ok(()),
            None => Err(UploaderError::Unreachable {
                url: url.to_string(),
                source: anyhow::anyhow!("HTTP status client error (404 Not Found)"),
            }),
        }
    }

    async fn fetch(&self, url: &str) -> Result<bytes::Bytes, UploaderError> {
        self.fetches
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.body.clone().ok_or_else(|| UploaderError::Fetch {
            url: url.to_string(),
            source: anyhow::anyhow!("HTTP status client error (404 Not Found)"),
        })
    }
}
