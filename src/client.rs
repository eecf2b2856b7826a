use std::time::Duration;

use geo::{Geometry, Point};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};
use url::Url;

use crate::catalog::{AreaCategory, ZonalDataset};
use crate::encoding::{Encodings, decode_encodings};
use crate::endpoint::{
    DEFAULT_BASE_URL, boundary_url, describe_coverage_url, is_http_url, places_url,
    zonal_stats_url,
};
use crate::error::{Error, Result};
use crate::geometry::{equal_area_centroid, from_geojson};
use crate::projection::{Crs, reproject};
use crate::table::ZonalTable;

#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Root of the earthmaps API.
    pub base_url: String,
    /// WCS endpoint used for DescribeCoverage requests.
    pub wcs_url: Option<String>,
    pub verify_tls: bool,
    pub user_agent: String,
    pub timeout: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            wcs_url: None,
            verify_tls: true,
            user_agent: concat!("ardac-earthmaps-rs/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Some(Duration::from_secs(120)),
        }
    }
}

/// One entry of `/places/{category}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Place {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// How features of a category are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureMode {
    /// One WGS84 point per place: community coordinates, or the equal-area
    /// centroid of each boundary.
    Point,
    /// Boundary polygons, optionally reprojected. Communities have none.
    Polygon { crs: Option<Crs> },
}

/// A place with its geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: String,
    pub name: String,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub geometry: Geometry<f64>,
    pub crs: Crs,
}

#[derive(Debug, Clone)]
pub struct Client {
    opts: ClientOptions,
    http: HttpClient,
}

impl Client {
    pub fn new(opts: ClientOptions) -> Result<Self> {
        if !is_http_url(&opts.base_url) {
            return Err(Error::InvalidRequest(format!(
                "base url must be http(s): {}",
                opts.base_url
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&opts.user_agent)
                .map_err(|e| Error::InvalidRequest(format!("invalid user agent: {e}")))?,
        );

        let mut builder = HttpClient::builder().default_headers(headers);
        if !opts.verify_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(timeout) = opts.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self { opts, http })
    }

    /// Convenience constructor for the public earthmaps API.
    pub fn default_client() -> Result<Self> {
        Self::new(ClientOptions::default())
    }

    pub fn options(&self) -> &ClientOptions {
        &self.opts
    }

    pub fn places(&self, category: AreaCategory) -> Result<Vec<Place>> {
        let url = places_url(&self.opts.base_url, category)?;
        let places: Vec<Place> = self.get(url)?.json()?;
        debug!(category = %category, count = places.len(), "fetched places");
        Ok(places)
    }

    /// Boundary of one area, in WGS84.
    pub fn boundary(&self, id: &str) -> Result<Geometry<f64>> {
        let url = boundary_url(&self.opts.base_url, id)?;
        let geojson: serde_json::Value = self.get(url)?.json()?;
        from_geojson(&geojson)
    }

    pub fn features(&self, category: AreaCategory, mode: FeatureMode) -> Result<Vec<Feature>> {
        if matches!(mode, FeatureMode::Polygon { .. }) && !category.has_boundaries() {
            return Err(Error::InvalidRequest(format!(
                "{category} has no boundary polygons, choose one of: {}",
                AreaCategory::with_boundaries()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        let places = self.places(category)?;

        let features = if !category.has_boundaries() {
            places
                .into_iter()
                .map(community_point)
                .collect::<Result<Vec<_>>>()?
        } else {
            let mut out = Vec::with_capacity(places.len());
            for place in places {
                let boundary = match self.boundary(&place.id) {
                    Ok(g) => g,
                    Err(e) => {
                        warn!(id = %place.id, name = %place.name, error = %e, "skipping area without boundary");
                        continue;
                    }
                };
                out.extend(area_feature(place, boundary, mode));
            }
            out
        };

        if features.is_empty() {
            return Err(Error::NoData(format!("{category} features")));
        }
        Ok(features)
    }

    /// Points for every place of `category`, in WGS84.
    pub fn point_features(&self, category: AreaCategory) -> Result<Vec<Feature>> {
        self.features(category, FeatureMode::Point)
    }

    /// Boundary polygons for every area of `category`.
    pub fn area_features(&self, category: AreaCategory, crs: Option<Crs>) -> Result<Vec<Feature>> {
        self.features(category, FeatureMode::Polygon { crs })
    }

    /// Zonal statistics of `dataset` for each feature, concatenated.
    ///
    /// Areas without data are logged and skipped.
    pub fn zonal_stats(&self, features: &[Feature], dataset: ZonalDataset) -> Result<ZonalTable> {
        let mut tables = Vec::with_capacity(features.len());
        for feature in features {
            match self.zonal_stats_for(&feature.id, dataset) {
                Ok(table) => tables.push(table.with_area(&feature.id, &feature.name)),
                Err(e) => {
                    warn!(
                        dataset = %dataset,
                        id = %feature.id,
                        name = %feature.name,
                        error = %e,
                        "no zonal data for area, trying next polygon"
                    );
                }
            }
        }

        if tables.is_empty() {
            return Err(Error::NoData(format!("{dataset} zonal statistics")));
        }
        Ok(ZonalTable::concat(tables))
    }

    fn zonal_stats_for(&self, id: &str, dataset: ZonalDataset) -> Result<ZonalTable> {
        let url = zonal_stats_url(&self.opts.base_url, dataset, id)?;
        let body = self.get(url)?.text()?;
        ZonalTable::from_csv(&body)
    }

    /// Raw DescribeCoverage XML for a coverage.
    pub fn describe_coverage(&self, coverage_id: &str) -> Result<String> {
        let wcs = self.opts.wcs_url.as_deref().ok_or_else(|| {
            Error::InvalidRequest("no WCS endpoint configured (ClientOptions::wcs_url)".into())
        })?;
        let url = describe_coverage_url(wcs, coverage_id)?;
        Ok(self.get(url)?.text()?)
    }

    /// Axis code tables of a coverage.
    pub fn coverage_encodings(&self, coverage_id: &str) -> Result<Encodings> {
        decode_encodings(&self.describe_coverage(coverage_id)?)
    }

    fn get(&self, url: Url) -> Result<reqwest::blocking::Response> {
        debug!(%url, "GET");
        Ok(self.http.get(url).send()?.error_for_status()?)
    }
}

fn community_point(place: Place) -> Result<Feature> {
    let (Some(lat), Some(lon)) = (place.latitude, place.longitude) else {
        return Err(Error::InvalidRequest(format!(
            "community {} has no coordinates",
            place.id
        )));
    };
    Ok(Feature {
        geometry: Geometry::Point(Point::new(lon, lat)),
        crs: Crs::Wgs84,
        id: place.id,
        name: place.name,
        country: place.country,
        latitude: Some(lat),
        longitude: Some(lon),
    })
}

/// Feature for one area, or `None` (with a warning) when it has no centroid.
fn area_feature(place: Place, boundary: Geometry<f64>, mode: FeatureMode) -> Option<Feature> {
    match mode {
        FeatureMode::Polygon { crs } => Some(polygon_feature(place, boundary, crs)),
        FeatureMode::Point => {
            let (id, name) = (place.id.clone(), place.name.clone());
            match centroid_feature(place, &boundary) {
                Ok(f) => Some(f),
                Err(e) => {
                    warn!(%id, %name, error = %e, "skipping area without centroid");
                    None
                }
            }
        }
    }
}

fn centroid_feature(place: Place, boundary: &Geometry<f64>) -> Result<Feature> {
    let centroid = equal_area_centroid(boundary)?;
    Ok(Feature {
        geometry: Geometry::Point(centroid),
        crs: Crs::Wgs84,
        id: place.id,
        name: place.name,
        country: place.country,
        latitude: Some(centroid.y()),
        longitude: Some(centroid.x()),
    })
}

fn polygon_feature(place: Place, boundary: Geometry<f64>, crs: Option<Crs>) -> Feature {
    let (geometry, crs) = match crs {
        Some(to) => (reproject(&boundary, Crs::Wgs84, to), to),
        None => (boundary, Crs::Wgs84),
    };
    Feature {
        geometry,
        crs,
        id: place.id,
        name: place.name,
        country: place.country,
        latitude: None,
        longitude: None,
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}
