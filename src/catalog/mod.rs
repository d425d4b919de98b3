//! Scene catalog access
//!
//! STAC models, search queries, validated scene candidates and a catalog
//! over ItemCollection documents on disk.

pub mod stac;
mod query;
mod candidate;
mod local;

pub use self::stac::{StacAsset, StacItem, StacItemCollection, StacItemProperties};
pub use self::query::{CatalogQuery, SceneCatalog};
pub use self::candidate::{parse_datetime, SceneCandidate};
pub use self::local::LocalCatalog;
