use url::Url;

use crate::catalog::{AreaCategory, ZonalDataset};
use crate::error::Result;

pub const DEFAULT_BASE_URL: &str = "https://earthmaps.io";

pub const WCS_VERSION: &str = "2.0.1";

pub fn is_http_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Resolve `path` below `base`, keeping any path prefix of `base`.
fn join(base: &str, path: &str) -> Result<Url> {
    let mut base = Url::parse(base)?;
    if !base.path().ends_with('/') {
        let p = format!("{}/", base.path());
        base.set_path(&p);
    }
    Ok(base.join(path.trim_start_matches('/'))?)
}

pub fn places_url(base: &str, category: AreaCategory) -> Result<Url> {
    join(base, &format!("places/{}", category.as_str()))
}

pub fn boundary_url(base: &str, id: &str) -> Result<Url> {
    join(base, &format!("boundary/area/{id}"))
}

pub fn zonal_stats_url(base: &str, dataset: ZonalDataset, id: &str) -> Result<Url> {
    let mut url = join(base, &format!("{}{id}", dataset.path()))?;
    url.query_pairs_mut().append_pair("format", "csv");
    Ok(url)
}

/// WCS 2.0.1 KVP DescribeCoverage request.
pub fn describe_coverage_url(wcs: &str, coverage_id: &str) -> Result<Url> {
    let mut url = Url::parse(wcs)?;
    url.query_pairs_mut()
        .append_pair("SERVICE", "WCS")
        .append_pair("VERSION", WCS_VERSION)
        .append_pair("REQUEST", "DescribeCoverage")
        .append_pair("COVERAGEID", coverage_id);
    Ok(url)
}
