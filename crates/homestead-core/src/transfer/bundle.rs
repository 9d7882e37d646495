//! Bundle: a snapshot of one or more collections plus metadata
//!
//! Wire format:
//!
//! ```text
//! {
//!   "<collection>": [ <record>, ... ],
//!   ...,
//!   "meta": { "version": 1, "exportedAt": <epoch-ms>, "scope": "<scope>", "userId": "<id>" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use super::error::{TransferError, TransferResult};
use crate::models::Record;

/// Current bundle format version
pub const BUNDLE_VERSION: u32 = 1;

/// Key of the metadata block
pub const META_KEY: &str = "meta";

/// Metadata describing where a bundle came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleMeta {
    pub version: u32,
    /// Epoch milliseconds
    pub exported_at: i64,
    pub scope: String,
    pub user_id: String,
}

/// Collections in order, plus optional metadata
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bundle {
    collections: Vec<(String, Vec<Record>)>,
    meta: Option<BundleMeta>,
}

impl Bundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a collection; order of calls is the order on the wire
    pub fn push_collection(&mut self, name: impl Into<String>, records: Vec<Record>) {
        self.collections.push((name.into(), records));
    }

    pub fn set_meta(&mut self, meta: BundleMeta) {
        self.meta = Some(meta);
    }

    pub fn meta(&self) -> Option<&BundleMeta> {
        self.meta.as_ref()
    }

    pub fn collections(&self) -> &[(String, Vec<Record>)] {
        &self.collections
    }

    /// Consume the bundle, dropping metadata
    pub fn into_collections(self) -> Vec<(String, Vec<Record>)> {
        self.collections
    }

    /// Serialize to pretty-printed JSON, collections first and `meta` last
    pub fn to_json(&self) -> TransferResult<Vec<u8>> {
        let mut root = Map::new();
        for (name, records) in &self.collections {
            let values = records
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<Vec<_>, _>>()?;
            root.insert(name.clone(), Value::Array(values));
        }
        if let Some(meta) = &self.meta {
            root.insert(META_KEY.to_string(), serde_json::to_value(meta)?);
        }
        Ok(serde_json::to_vec_pretty(&Value::Object(root))?)
    }

    /// Parse and validate a JSON bundle
    ///
    /// Every collection must be an array of objects carrying a string `id`.
    /// A missing or unreadable `meta` block is tolerated.
    pub fn from_json(bytes: &[u8]) -> TransferResult<Self> {
        let root = match serde_json::from_slice::<Value>(bytes)? {
            Value::Object(root) => root,
            _ => {
                return Err(TransferError::InvalidBundle(
                    "top level must be an object".to_string(),
                ))
            }
        };

        let mut bundle = Bundle::new();
        for (key, value) in root {
            if key == META_KEY {
                match serde_json::from_value::<BundleMeta>(value) {
                    Ok(meta) => bundle.meta = Some(meta),
                    Err(e) => warn!("Ignoring unreadable bundle metadata: {}", e),
                }
                continue;
            }

            let Value::Array(items) = value else {
                return Err(TransferError::InvalidBundle(format!(
                    "collection '{}' is not an array",
                    key
                )));
            };

            let records = items
                .into_iter()
                .map(Record::from_value)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| TransferError::InvalidRecord {
                    collection: key.clone(),
                    source,
                })?;

            bundle.collections.push((key, records));
        }

        Ok(bundle)
    }
}
