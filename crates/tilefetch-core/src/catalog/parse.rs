//! Minimal GeoJSON structures for the tile catalog (only what the downloader reads).

use serde::Deserialize;

/// Root `FeatureCollection`; `type`, `crs` and friends are ignored.
#[derive(Debug, Deserialize)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
pub struct Feature {
    pub properties: Properties,
}

#[derive(Debug, Deserialize)]
pub struct Properties {
    pub link_data: String,
    pub kachel: TextValue,
    pub datum: TextValue,
}

/// Property that some exports write as a string and others as a bare number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TextValue {
    Text(String),
    Number(serde_json::Number),
}

impl TextValue {
    pub fn into_string(self) -> String {
        match self {
            TextValue::Text(s) => s,
            TextValue::Number(n) => n.to_string(),
        }
    }
}
