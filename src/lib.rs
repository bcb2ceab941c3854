//! Client for the DataCite REST API.
//!
//! ```no_run
//! use datacite::{ClientConfig, DataCiteClient};
//!
//! # async fn run() -> datacite::Result<()> {
//! let config = ClientConfig::new("DATACITE.USER", "secret", "10.5072").with_test_mode(true);
//! let client = DataCiteClient::new(config)?;
//!
//! let doi = client.create_draft(None).await?;
//! client.set_url(&doi.to_string(), "https://example.org/record/1").await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod doi;
pub mod error;
pub mod metadata;
pub mod runtime;

pub use client::{DataCiteClient, DoiRegistry};
pub use config::ClientConfig;
pub use doi::{Doi, normalize_doi};
pub use error::{DataCiteError, Result};
pub use metadata::{DoiRecord, Envelope, Event, Metadata};
