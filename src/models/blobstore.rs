// Blobstore listing records and capacity figures.

use serde::Deserialize;

use super::coerce;

/// One entry of `GET /service/rest/v1/blobstores`.
///
/// Nexus reports the *used* bytes as `totalSizeInBytes`; the full size of the store is
/// used + available.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobstoreSummary {
    #[serde(default, deserialize_with = "coerce::lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "coerce::lenient_f64")]
    pub total_size_in_bytes: f64,
    #[serde(default, deserialize_with = "coerce::lenient_f64")]
    pub available_space_in_bytes: f64,
    #[serde(default, deserialize_with = "coerce::lenient_f64")]
    pub blob_count: f64,
}

impl BlobstoreSummary {
    pub fn inline_capacity(&self) -> BlobstoreCapacity {
        BlobstoreCapacity {
            total_bytes: self.total_size_in_bytes + self.available_space_in_bytes,
            used_bytes: self.total_size_in_bytes,
            item_count: self.blob_count,
        }
    }

    pub fn with_inline_capacity(self) -> Blobstore {
        let capacity = self.inline_capacity();
        Blobstore {
            name: self.name,
            capacity: Some(capacity),
        }
    }
}

/// Capacity in one shape, whichever source it came from.
/// Deserializes from `GET /service/rest/v1/blobstores/{name}/capacity`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct BlobstoreCapacity {
    #[serde(rename = "totalSpace", default, deserialize_with = "coerce::lenient_f64")]
    pub total_bytes: f64,
    #[serde(rename = "usedSpace", default, deserialize_with = "coerce::lenient_f64")]
    pub used_bytes: f64,
    #[serde(rename = "itemCount", default, deserialize_with = "coerce::lenient_f64")]
    pub item_count: f64,
}

/// A listed blobstore. `capacity` is `None` when its capacity lookup failed; the
/// blobstore still counts toward the blobstore total but gets no per-name gauges.
#[derive(Debug, Clone, PartialEq)]
pub struct Blobstore {
    pub name: String,
    pub capacity: Option<BlobstoreCapacity>,
}
