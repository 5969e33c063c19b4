//! Fetch-and-parse boundary for the four external datasets.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    domain::{ControllerRef, ModuleCandidate, PointCandidate, ReferenceRecord},
    error::DataSourceError,
    protocol::{ControllerTypeEntry, Dataset, DatasetEntry, ReferenceBlocksEnvelope},
};
use tracing::{debug, warn};
use url::Url;

#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch(&self, resource: &str) -> Result<Value, DataSourceError>;
}

/// Serves `<base_url>/<resource>.json`.
pub struct HttpDataSource {
    http: Client,
    base_url: Url,
}

impl HttpDataSource {
    pub fn new(base_url: Url) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, mut base_url: Url) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { http, base_url }
    }

    pub fn resource_url(&self, resource: &str) -> Result<Url, DataSourceError> {
        self.base_url
            .join(&format!("{resource}.json"))
            .map_err(|err| DataSourceError::Transport {
                resource: resource.to_owned(),
                message: err.to_string(),
            })
    }
}

#[async_trait]
impl DataSource for HttpDataSource {
    async fn fetch(&self, resource: &str) -> Result<Value, DataSourceError> {
        let url = self.resource_url(resource)?;
        debug!(%url, "fetching dataset");

        let transport = |err: reqwest::Error| DataSourceError::Transport {
            resource: resource.to_owned(),
            message: err.to_string(),
        };

        let response = self.http.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(DataSourceError::Status {
                resource: resource.to_owned(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        serde_json::from_slice(&body).map_err(|source| DataSourceError::Parse {
            resource: resource.to_owned(),
            source,
        })
    }
}

/// Reads `<root>/<resource>.json` from disk.
pub struct FileDataSource {
    root: PathBuf,
}

impl FileDataSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resource_path(&self, resource: &str) -> PathBuf {
        self.root.join(format!("{resource}.json"))
    }
}

#[async_trait]
impl DataSource for FileDataSource {
    async fn fetch(&self, resource: &str) -> Result<Value, DataSourceError> {
        let path = self.resource_path(resource);
        debug!(path = %path.display(), "reading dataset");

        let raw = tokio::fs::read(&path)
            .await
            .map_err(|source| DataSourceError::Io {
                resource: resource.to_owned(),
                source,
            })?;
        serde_json::from_slice(&raw).map_err(|source| DataSourceError::Parse {
            resource: resource.to_owned(),
            source,
        })
    }
}

/// A dataset normalized into the types the workflow pools hold.
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetPayload {
    Controllers(Vec<ControllerRef>),
    Points(Vec<PointCandidate>),
    Modules(Vec<ModuleCandidate>),
    References(Vec<ReferenceRecord>),
}

impl DatasetPayload {
    pub fn dataset(&self) -> Dataset {
        match self {
            Self::Controllers(_) => Dataset::ControllerTypes,
            Self::Points(_) => Dataset::LoopSelection,
            Self::Modules(_) => Dataset::CutoutoverContent,
            Self::References(_) => Dataset::ReferenceBlocks,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Controllers(items) => items.len(),
            Self::Points(items) => items.len(),
            Self::Modules(items) => items.len(),
            Self::References(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone)]
pub struct DatasetLoader {
    source: Arc<dyn DataSource>,
}

impl DatasetLoader {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    pub async fn load(&self, dataset: Dataset) -> Result<DatasetPayload, DataSourceError> {
        let value = self.source.fetch(dataset.resource_id()).await?;
        decode(dataset, value)
    }
}

/// Normalizes a raw dataset. A reference envelope of the wrong shape is not an
/// error here: it is logged and treated as an empty reference set.
pub fn decode(dataset: Dataset, value: Value) -> Result<DatasetPayload, DataSourceError> {
    let payload = match dataset {
        Dataset::ControllerTypes => DatasetPayload::Controllers(
            parse::<Vec<ControllerTypeEntry>>(dataset, value)?
                .into_iter()
                .map(ControllerRef::from)
                .collect(),
        ),
        Dataset::LoopSelection => DatasetPayload::Points(
            parse::<Vec<DatasetEntry>>(dataset, value)?
                .into_iter()
                .map(|entry| PointCandidate::new(entry.into_name()))
                .collect(),
        ),
        Dataset::CutoutoverContent => DatasetPayload::Modules(
            parse::<Vec<DatasetEntry>>(dataset, value)?
                .into_iter()
                .map(|entry| ModuleCandidate::new(entry.into_name()))
                .collect(),
        ),
        Dataset::ReferenceBlocks => DatasetPayload::References(
            unwrap_reference_envelope(value).unwrap_or_else(|err| {
                warn!(%err, "reference blocks unusable; continuing with an empty set");
                Vec::new()
            }),
        ),
    };
    Ok(payload)
}

pub fn unwrap_reference_envelope(value: Value) -> Result<Vec<ReferenceRecord>, DataSourceError> {
    let resource = Dataset::ReferenceBlocks.resource_id();
    match value.get("controllers") {
        Some(Value::Array(_)) => {}
        Some(_) => {
            return Err(DataSourceError::ShapeMismatch {
                resource: resource.to_owned(),
                detail: "`controllers` is not an array".into(),
            })
        }
        None => {
            return Err(DataSourceError::ShapeMismatch {
                resource: resource.to_owned(),
                detail: "missing `controllers` field".into(),
            })
        }
    }

    serde_json::from_value::<ReferenceBlocksEnvelope>(value)
        .map(|envelope| envelope.controllers)
        .map_err(|err| DataSourceError::ShapeMismatch {
            resource: resource.to_owned(),
            detail: err.to_string(),
        })
}

fn parse<T: DeserializeOwned>(dataset: Dataset, value: Value) -> Result<T, DataSourceError> {
    serde_json::from_value(value).map_err(|source| DataSourceError::Parse {
        resource: dataset.resource_id().to_owned(),
        source,
    })
}

#[cfg(test)]
#[path = "tests/source_tests.rs"]
mod tests;
