//! Catalog loader: GeoJSON feature collection → ordered job records.
//!
//! Record order is the feature order of the document; run ranges select
//! records by this position, so it must never be changed here.

mod parse;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use parse::FeatureCollection;

/// One downloadable tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRecord {
    pub source_url: String,
    pub tile_id: String,
    pub date: String,
}

/// Ordered, read-only list of job records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    records: Vec<JobRecord>,
}

impl Catalog {
    pub fn new(records: Vec<JobRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[JobRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to open catalog {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse catalog {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("catalog {}: feature {} has an empty link_data", .path.display(), .index)]
    EmptyLink { path: PathBuf, index: usize },
}

/// Load and parse the catalog at `path`.
pub fn load_catalog(path: &Path) -> Result<Catalog, CatalogError> {
    let file = File::open(path).map_err(|source| CatalogError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let catalog = parse_catalog(BufReader::new(file), path)?;
    tracing::info!(
        path = %path.display(),
        features = catalog.len(),
        "catalog loaded"
    );
    Ok(catalog)
}

/// Parse a catalog from any reader. `origin` only labels errors.
pub fn parse_catalog<R: Read>(reader: R, origin: &Path) -> Result<Catalog, CatalogError> {
    let collection: FeatureCollection =
        serde_json::from_reader(reader).map_err(|source| CatalogError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;

    let mut records = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.into_iter().enumerate() {
        let props = feature.properties;
        let source_url = props.link_data.trim().to_string();
        if source_url.is_empty() {
            return Err(CatalogError::EmptyLink {
                path: origin.to_path_buf(),
                index,
            });
        }
        records.push(JobRecord {
            source_url,
            tile_id: props.kachel.into_string(),
            date: props.datum.into_string(),
        });
    }
    Ok(Catalog::new(records))
}
