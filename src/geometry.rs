//! GeoJSON boundaries to `geo` geometries.

use geo::{
    Centroid, Coord, Geometry, GeometryCollection, LineString, MultiLineString, MultiPoint,
    MultiPolygon, Point, Polygon,
};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::projection::{Crs, reproject};

/// Parse a GeoJSON object (Feature, FeatureCollection or bare geometry).
pub fn from_geojson(value: &Value) -> Result<Geometry<f64>> {
    let kind = value
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or_else(|| Error::InvalidGeometry("GeoJSON object without a type".into()))?;

    match kind {
        "Feature" => {
            let geometry = value
                .get("geometry")
                .filter(|g| !g.is_null())
                .ok_or_else(|| Error::InvalidGeometry("feature without geometry".into()))?;
            from_geojson(geometry)
        }
        "FeatureCollection" => {
            let features = value
                .get("features")
                .and_then(|f| f.as_array())
                .ok_or_else(|| Error::InvalidGeometry("feature collection without features".into()))?;
            let geometries = features.iter().map(from_geojson).collect::<Result<Vec<_>>>()?;
            Ok(Geometry::GeometryCollection(GeometryCollection(geometries)))
        }
        "GeometryCollection" => {
            let geometries = value
                .get("geometries")
                .and_then(|g| g.as_array())
                .ok_or_else(|| Error::InvalidGeometry("geometry collection without geometries".into()))?;
            let geometries = geometries.iter().map(from_geojson).collect::<Result<Vec<_>>>()?;
            Ok(Geometry::GeometryCollection(GeometryCollection(geometries)))
        }
        "Point" => {
            let p: Vec<f64> = coordinates(value)?;
            Ok(Geometry::Point(Point::from(position(&p)?)))
        }
        "MultiPoint" => {
            let ps: Vec<Vec<f64>> = coordinates(value)?;
            let points = ps
                .iter()
                .map(|p| position(p).map(Point::from))
                .collect::<Result<Vec<_>>>()?;
            Ok(Geometry::MultiPoint(MultiPoint(points)))
        }
        "LineString" => {
            let ps: Vec<Vec<f64>> = coordinates(value)?;
            Ok(Geometry::LineString(line_string(&ps)?))
        }
        "MultiLineString" => {
            let ls: Vec<Vec<Vec<f64>>> = coordinates(value)?;
            let lines = ls.iter().map(|l| line_string(l)).collect::<Result<Vec<_>>>()?;
            Ok(Geometry::MultiLineString(MultiLineString(lines)))
        }
        "Polygon" => {
            let rings: Vec<Vec<Vec<f64>>> = coordinates(value)?;
            Ok(Geometry::Polygon(polygon(&rings)?))
        }
        "MultiPolygon" => {
            let polys: Vec<Vec<Vec<Vec<f64>>>> = coordinates(value)?;
            let polys = polys.iter().map(|p| polygon(p)).collect::<Result<Vec<_>>>()?;
            Ok(Geometry::MultiPolygon(MultiPolygon(polys)))
        }
        other => Err(Error::InvalidGeometry(format!("unsupported GeoJSON type {other}"))),
    }
}

fn coordinates<T: serde::de::DeserializeOwned>(value: &Value) -> Result<T> {
    let coords = value
        .get("coordinates")
        .ok_or_else(|| Error::InvalidGeometry("geometry without coordinates".into()))?;
    Ok(serde_json::from_value(coords.clone())?)
}

fn position(p: &[f64]) -> Result<Coord<f64>> {
    match p {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(Error::InvalidGeometry(format!("position needs two values, got {p:?}"))),
    }
}

fn line_string(ps: &[Vec<f64>]) -> Result<LineString<f64>> {
    Ok(LineString::new(
        ps.iter().map(|p| position(p)).collect::<Result<Vec<_>>>()?,
    ))
}

fn polygon(rings: &[Vec<Vec<f64>>]) -> Result<Polygon<f64>> {
    let Some((exterior, interiors)) = rings.split_first() else {
        return Err(Error::InvalidGeometry("polygon without rings".into()));
    };
    Ok(Polygon::new(
        line_string(exterior)?,
        interiors.iter().map(|r| line_string(r)).collect::<Result<Vec<_>>>()?,
    ))
}

/// Centroid of a WGS84 geometry, computed in Alaska Albers and returned as
/// WGS84 lon/lat.
pub fn equal_area_centroid(geometry: &Geometry<f64>) -> Result<Point<f64>> {
    let projected = reproject(geometry, Crs::Wgs84, Crs::AlaskaAlbers);
    let centroid = projected
        .centroid()
        .ok_or_else(|| Error::InvalidGeometry("empty geometry has no centroid".into()))?;
    match reproject(&Geometry::Point(centroid), Crs::AlaskaAlbers, Crs::Wgs84) {
        Geometry::Point(p) => Ok(p),
        _ => Err(Error::InvalidGeometry("reprojected centroid is not a point".into())),
    }
}
