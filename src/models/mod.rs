// Typed records decoded from the Nexus REST API.

pub mod coerce;

mod asset;
mod blobstore;
mod repository;

pub use asset::{Asset, Page};
pub use blobstore::{Blobstore, BlobstoreCapacity, BlobstoreSummary};
pub use repository::Repository;

/// One page of `search/assets`.
pub type AssetPage = Page<Asset>;
