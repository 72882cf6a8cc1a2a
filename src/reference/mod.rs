//! Externally identified reference records and the fetch seam.
//!
//! [`ReferenceFetcher`] is implemented by the transport ([`http::HttpFetcher`]
//! in production, fakes in tests). [`cache::ReferenceCache`] sits in front of it.

pub mod cache;
pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// The kinds of record the remote service hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Place,
    Project,
    User,
    Taxon,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Place => "place",
            Self::Project => "project",
            Self::User => "user",
            Self::Taxon => "taxon",
        }
    }

    /// Most ids one fetch may carry. The remote rejects larger requests
    /// (422 Unprocessable Entity).
    pub fn batch_ceiling(&self) -> usize {
        match self {
            Self::Place => 500,
            Self::Project => 10,
            Self::Taxon => 30,
            Self::User => 1,
        }
    }

    /// Path segment of the REST collection for this kind.
    pub fn api_path(&self) -> &'static str {
        match self {
            Self::Place => "places",
            Self::Project => "projects",
            Self::User => "users",
            Self::Taxon => "taxa",
        }
    }

    /// Path segment of the record's page on the public website.
    pub fn web_path(&self) -> &'static str {
        match self {
            Self::User => "people",
            _ => self.api_path(),
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record fetched from the remote service. Identity is `(kind, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRecord {
    pub kind: RecordKind,
    pub id: u64,
    pub display_name: String,
    /// Public web page for the record.
    pub url: String,
}

impl ExternalRecord {
    pub fn key(&self) -> (RecordKind, u64) {
        (self.kind, self.id)
    }

    /// Markdown link to the record's page.
    pub fn link(&self) -> String {
        format!("[{}]({})", self.display_name, self.url)
    }
}

/// Fetches reference records by id.
///
/// Callers never pass more than [`RecordKind::batch_ceiling`] ids at once.
/// Ids the remote does not know are simply absent from the result.
#[async_trait]
pub trait ReferenceFetcher: Send + Sync {
    async fn fetch(&self, kind: RecordKind, ids: &[u64]) -> Result<Vec<ExternalRecord>>;
}
