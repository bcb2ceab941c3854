//! DataCite REST API client.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, RequestBuilder, StatusCode, Url, header::CONTENT_TYPE};

use crate::config::{ClientConfig, JSON_API};
use crate::doi::{Doi, normalize_doi};
use crate::error::{DataCiteError, Result};
use crate::metadata::{DoiRecord, Envelope, Event, Metadata};

/// Operations against a DOI registration service.
///
/// With the `mock` feature enabled, `MockDoiRegistry` is generated for use
/// in downstream tests.
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait DoiRegistry: Send + Sync {
    async fn resolve(&self, doi: &str) -> Result<Option<String>>;
    async fn get_doi(&self, doi: &str) -> Result<DoiRecord>;
    async fn create_draft(&self, doi: Option<String>) -> Result<Doi>;
    async fn set_url(&self, doi: &str, url: &str) -> Result<String>;
    async fn publish(&self, metadata: Metadata, doi: Option<String>) -> Result<Doi>;
    async fn register_private(&self, metadata: Metadata, doi: Option<String>) -> Result<Doi>;
    async fn hide(&self, doi: &str) -> Result<Doi>;
}

/// Client for the DataCite `/dois` REST endpoints.
///
/// Every operation sends exactly one request. Nothing is retried: a failed
/// call surfaces immediately as a [`DataCiteError`].
#[derive(Clone)]
pub struct DataCiteClient {
    config: ClientConfig,
    client: Client,
}

impl std::fmt::Debug for DataCiteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<DataCiteClient: {}>", self.config.username())
    }
}

impl DataCiteClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = config.http_client()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the URL a DOI currently resolves to, or `None` for a DOI
    /// without one (drafts usually have no URL yet).
    #[tracing::instrument(skip(self))]
    pub async fn resolve(&self, doi: &str) -> Result<Option<String>> {
        let record = self.get_doi(doi).await?;
        Ok(record.url().map(str::to_string))
    }

    /// Fetches the full DOI resource.
    #[tracing::instrument(skip(self))]
    pub async fn get_doi(&self, doi: &str) -> Result<DoiRecord> {
        let request = self.client.get(self.doi_url(doi)?);
        let body = self.send(request, StatusCode::OK).await?;
        parse_record(&body)
    }

    /// Checks a DOI against the configured prefix and returns its normalized form.
    ///
    /// A bare suffix such as `abc-123` gets the configured prefix prepended.
    pub fn validate_identifier(&self, doi: &str) -> Result<String> {
        let prefix = self.config.prefix();
        if !doi.contains('/') {
            return normalize_doi(&format!("{}/{}", prefix, doi.trim()));
        }

        // Resolver URLs and `doi:` forms must be stripped before the prefix is compared
        let candidate = normalize_doi(doi).unwrap_or_else(|_| doi.trim().to_string());
        let found = candidate.split('/').next().unwrap_or_default();
        if found != prefix {
            return Err(DataCiteError::PrefixMismatch {
                expected: prefix.to_string(),
                found: found.to_string(),
            });
        }

        normalize_doi(&candidate)
    }

    /// Creates a draft DOI. Drafts can still be deleted.
    ///
    /// Without an explicit DOI, DataCite generates a random suffix under the
    /// configured prefix.
    #[tracing::instrument(skip(self))]
    pub async fn create_draft(&self, doi: Option<&str>) -> Result<Doi> {
        let mut attributes = Metadata::new();
        match doi {
            Some(doi) => {
                attributes.insert("doi".to_string(), self.validate_identifier(doi)?.into());
            }
            None => {
                attributes.insert("prefix".to_string(), self.config.prefix().into());
            }
        }

        let record = self.post_doi(attributes).await?;
        record_doi(&record)
    }

    /// Changes the landing page a DOI resolves to and returns the URL
    /// DataCite acknowledged. When the response does not echo a URL, the
    /// requested one is returned.
    #[tracing::instrument(skip(self))]
    pub async fn set_url(&self, doi: &str, url: &str) -> Result<String> {
        let doi = self.validate_identifier(doi)?;
        let mut attributes = Metadata::new();
        attributes.insert("url".to_string(), url.into());

        let record = self.put_doi(&doi, attributes).await?;
        Ok(record.url().unwrap_or(url).to_string())
    }

    /// Publishes a findable DOI with the given metadata. Findable DOIs
    /// cannot be deleted.
    #[tracing::instrument(skip(self, metadata))]
    pub async fn publish(&self, metadata: Metadata, doi: Option<&str>) -> Result<Doi> {
        self.post_with_event(metadata, doi, Event::Publish).await
    }

    /// Registers a DOI that resolves but is not listed in DataCite Search.
    #[tracing::instrument(skip(self, metadata))]
    pub async fn register_private(&self, metadata: Metadata, doi: Option<&str>) -> Result<Doi> {
        self.post_with_event(metadata, doi, Event::Register).await
    }

    /// Hides a findable DOI from DataCite Search.
    #[tracing::instrument(skip(self))]
    pub async fn hide(&self, doi: &str) -> Result<Doi> {
        let mut attributes = Metadata::new();
        attributes.insert("event".to_string(), Event::Hide.as_str().into());
        attributes.insert("doi".to_string(), self.validate_identifier(doi)?.into());

        let record = self.post_doi(attributes).await?;
        record_doi(&record)
    }

    async fn post_with_event(
        &self,
        mut attributes: Metadata,
        doi: Option<&str>,
        event: Event,
    ) -> Result<Doi> {
        attributes.insert("prefix".to_string(), self.config.prefix().into());
        attributes.insert("event".to_string(), event.as_str().into());
        if let Some(doi) = doi {
            attributes.insert("doi".to_string(), self.validate_identifier(doi)?.into());
        }

        let record = self.post_doi(attributes).await?;
        record_doi(&record)
    }

    async fn post_doi(&self, attributes: Metadata) -> Result<DoiRecord> {
        let request = self
            .client
            .post(self.config.endpoint(["dois"])?)
            .header(CONTENT_TYPE, JSON_API)
            .json(&Envelope::new(attributes));

        let body = self.send(request, StatusCode::CREATED).await?;
        parse_record(&body)
    }

    async fn put_doi(&self, doi: &str, attributes: Metadata) -> Result<DoiRecord> {
        let request = self
            .client
            .put(self.doi_url(doi)?)
            .header(CONTENT_TYPE, JSON_API)
            .json(&Envelope::new(attributes));

        let body = self.send(request, StatusCode::OK).await?;
        parse_record(&body)
    }

    /// `dois/{prefix}/{suffix...}` with every segment percent-encoded.
    fn doi_url(&self, doi: &str) -> Result<Url> {
        let segments: Vec<&str> = doi.split('/').collect();
        if segments
            .iter()
            .any(|segment| matches!(*segment, "" | "." | ".."))
        {
            return Err(DataCiteError::InvalidDoi(doi.to_string()));
        }
        self.config.endpoint(std::iter::once("dois").chain(segments))
    }

    /// Sends one authenticated request and returns the body when the status
    /// matches `expected`; any other status is classified into an error.
    async fn send(&self, request: RequestBuilder, expected: StatusCode) -> Result<String> {
        let response = request
            .basic_auth(self.config.username(), Some(self.config.password()))
            .send()
            .await?;

        let status = response.status();
        let url = response.url().to_string();
        let body = response.text().await?;
        debug!("{} -> HTTP {}", url, status.as_u16());

        if status == expected {
            Ok(body)
        } else {
            warn!("DataCite returned HTTP {} for {}", status.as_u16(), url);
            Err(DataCiteError::from_status(status, body))
        }
    }
}

#[async_trait]
impl DoiRegistry for DataCiteClient {
    async fn resolve(&self, doi: &str) -> Result<Option<String>> {
        DataCiteClient::resolve(self, doi).await
    }

    async fn get_doi(&self, doi: &str) -> Result<DoiRecord> {
        DataCiteClient::get_doi(self, doi).await
    }

    async fn create_draft(&self, doi: Option<String>) -> Result<Doi> {
        DataCiteClient::create_draft(self, doi.as_deref()).await
    }

    async fn set_url(&self, doi: &str, url: &str) -> Result<String> {
        DataCiteClient::set_url(self, doi, url).await
    }

    async fn publish(&self, metadata: Metadata, doi: Option<String>) -> Result<Doi> {
        DataCiteClient::publish(self, metadata, doi.as_deref()).await
    }

    async fn register_private(&self, metadata: Metadata, doi: Option<String>) -> Result<Doi> {
        DataCiteClient::register_private(self, metadata, doi.as_deref()).await
    }

    async fn hide(&self, doi: &str) -> Result<Doi> {
        DataCiteClient::hide(self, doi).await
    }
}

fn parse_record(body: &str) -> Result<DoiRecord> {
    serde_json::from_str::<Envelope>(body)
        .map(|envelope| envelope.data)
        .map_err(|e| DataCiteError::UnexpectedResponse(format!("invalid JSON:API document: {}", e)))
}

fn record_doi(record: &DoiRecord) -> Result<Doi> {
    record
        .doi()
        .ok_or_else(|| DataCiteError::UnexpectedResponse("response carries no DOI".to_string()))?
        .parse()
}
