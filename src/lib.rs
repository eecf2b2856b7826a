#![forbid(unsafe_code)]

//! Rust client for the ARDAC `earthmaps.io` data API.
//!
//! The crate fetches places, boundaries and zonal statistics from the
//! earthmaps API, and decodes the categorical axis encodings that Rasdaman
//! coverages publish in their WCS `DescribeCoverage` metadata.
//!
//! **Places and zonal statistics**
//! ```no_run
//! use ardac_earthmaps::{AreaCategory, Client, ZonalDataset};
//!
//! let client = Client::default_client()?;
//! let zones = client.area_features(AreaCategory::FireZones, None)?;
//! let table = client.zonal_stats(&zones, ZonalDataset::Flammability)?;
//! table.write_csv(std::io::stdout())?;
//! # Ok::<(), ardac_earthmaps::Error>(())
//! ```
//!
//! **Coverage encodings**
//! ```
//! use ardac_earthmaps::{CoordValue, Dataset, decode_encodings};
//!
//! let enc = decode_encodings(
//!     r#"<Encoding><model>{"0":"GFDL-CM3","1":"NCAR-CCSM4"}</model></Encoding>"#,
//! )?;
//! let ds = Dataset::new().with_coord("model", [1, 0]).labeled(&enc)?;
//! assert_eq!(ds.coord("model").unwrap()[0], CoordValue::from("NCAR-CCSM4"));
//! # Ok::<(), ardac_earthmaps::Error>(())
//! ```
//!
//! Notes:
//! - Batch helpers skip areas whose boundary or statistics cannot be fetched
//!   and log a `tracing` warning for each; install a subscriber to see them.
//! - Reprojection supports EPSG:4326 and EPSG:3338 only.

mod catalog;
mod client;
mod dataset;
mod encoding;
mod endpoint;
mod error;
mod geometry;
mod labeler;
mod literal;
mod projection;
mod table;
mod timerange;

pub use crate::catalog::{AreaCategory, ZonalDataset};
pub use crate::client::{Client, ClientOptions, Feature, FeatureMode, Place};
pub use crate::dataset::{CoordValue, Dataset, Variable};
pub use crate::encoding::{DimensionEncoding, Encodings, Label, decode_encodings};
pub use crate::endpoint::DEFAULT_BASE_URL;
pub use crate::error::{Error, Result};
pub use crate::geometry::{equal_area_centroid, from_geojson};
pub use crate::labeler::assign_coordinate_labels;
pub use crate::literal::parse_dict;
pub use crate::projection::{AlbersEqualArea, Crs, reproject};
pub use crate::table::ZonalTable;
pub use crate::timerange::{TimeRangeParams, parse_frequency, timerange_params};
