// Assets and the paginated search envelope.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::coerce;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "AssetRecord")]
pub struct Asset {
    pub repository: String,
    /// Bytes.
    pub size: f64,
    /// `None` when the asset was never downloaded or the timestamp is unparsable.
    pub last_downloaded: Option<DateTime<Utc>>,
}

/// Wire shape. Older Nexus versions report `fileSize` instead of `size`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetRecord {
    #[serde(default, deserialize_with = "coerce::lenient_string")]
    repository: String,
    #[serde(default)]
    size: Option<Value>,
    #[serde(default)]
    file_size: Option<Value>,
    #[serde(default)]
    last_downloaded: Option<Value>,
}

impl From<AssetRecord> for Asset {
    fn from(r: AssetRecord) -> Self {
        let size = r
            .size
            .or(r.file_size)
            .map(|v| coerce::coerce_f64(&v))
            .unwrap_or(0.0);
        Asset {
            repository: r.repository,
            size,
            last_downloaded: r.last_downloaded.as_ref().and_then(coerce::coerce_timestamp),
        }
    }
}

/// `{ items: [...], continuationToken: string|null }`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = "T: DeserializeOwned + Default"))]
pub struct Page<T> {
    #[serde(default, deserialize_with = "coerce::lenient_seq")]
    pub items: Vec<T>,
    #[serde(default, deserialize_with = "coerce::lenient_token")]
    pub continuation_token: Option<String>,
}
