use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single coordinate value on a named axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoordValue {
    Int(i64),
    Label(String),
}

impl fmt::Display for CoordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordValue::Int(i) => write!(f, "{i}"),
            CoordValue::Label(s) => f.write_str(s),
        }
    }
}

impl From<i64> for CoordValue {
    fn from(value: i64) -> Self {
        CoordValue::Int(value)
    }
}

impl From<i32> for CoordValue {
    fn from(value: i32) -> Self {
        CoordValue::Int(value as i64)
    }
}

impl From<&str> for CoordValue {
    fn from(value: &str) -> Self {
        CoordValue::Label(value.to_string())
    }
}

impl From<String> for CoordValue {
    fn from(value: String) -> Self {
        CoordValue::Label(value)
    }
}

/// Data variable laid out row-major over `dims`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    pub dims: Vec<String>,
    pub values: Vec<f64>,
}

/// Multi-dimensional array with named coordinate axes, shaped like a
/// coverage subset returned from Rasdaman.
///
/// Deserialized datasets are checked the same way as ones built with
/// [`Dataset::with_variable`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDataset")]
pub struct Dataset {
    coords: BTreeMap<String, Vec<CoordValue>>,
    variables: BTreeMap<String, Variable>,
}

#[derive(Deserialize)]
struct RawDataset {
    #[serde(default)]
    coords: BTreeMap<String, Vec<CoordValue>>,
    #[serde(default)]
    variables: BTreeMap<String, Variable>,
}

impl TryFrom<RawDataset> for Dataset {
    type Error = Error;

    fn try_from(raw: RawDataset) -> Result<Self> {
        for (name, var) in &raw.variables {
            check_shape(&raw.coords, name, &var.dims, var.values.len())?;
        }
        Ok(Self {
            coords: raw.coords,
            variables: raw.variables,
        })
    }
}

/// Dims must name existing axes and `len` must equal the product of their lengths.
fn check_shape<D: AsRef<str>>(
    coords: &BTreeMap<String, Vec<CoordValue>>,
    name: &str,
    dims: &[D],
    len: usize,
) -> Result<()> {
    let mut expected = 1usize;
    for dim in dims {
        let dim = dim.as_ref();
        let axis = coords.get(dim).ok_or_else(|| {
            Error::InvalidRequest(format!("variable {name} uses unknown dimension {dim}"))
        })?;
        expected *= axis.len();
    }
    if expected != len {
        return Err(Error::ShapeMismatch {
            name: name.to_string(),
            expected,
            actual: len,
        });
    }
    Ok(())
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a coordinate axis.
    pub fn with_coord<V>(mut self, name: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self
    where
        V: Into<CoordValue>,
    {
        self.coords
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    /// Add a data variable over existing axes.
    pub fn with_variable(
        mut self,
        name: impl Into<String>,
        dims: &[&str],
        values: Vec<f64>,
    ) -> Result<Self> {
        let name = name.into();
        check_shape(&self.coords, &name, dims, values.len())?;
        self.variables.insert(
            name,
            Variable {
                dims: dims.iter().map(|d| d.to_string()).collect(),
                values,
            },
        );
        Ok(self)
    }

    pub fn coord(&self, name: &str) -> Option<&[CoordValue]> {
        self.coords.get(name).map(|v| v.as_slice())
    }

    pub fn dims(&self) -> impl Iterator<Item = &str> {
        self.coords.keys().map(|k| k.as_str())
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    /// Replace the values of an existing axis. The axis length cannot change.
    pub fn assign_coord(&mut self, name: &str, values: Vec<CoordValue>) -> Result<()> {
        let axis = self
            .coords
            .get_mut(name)
            .ok_or_else(|| Error::InvalidRequest(format!("no such dimension: {name}")))?;
        if axis.len() != values.len() {
            return Err(Error::ShapeMismatch {
                name: name.to_string(),
                expected: axis.len(),
                actual: values.len(),
            });
        }
        *axis = values;
        Ok(())
    }

    /// Value of `variable` at the given coordinate labels, one per dimension.
    pub fn select(&self, variable: &str, at: &[(&str, CoordValue)]) -> Option<f64> {
        let var = self.variables.get(variable)?;
        let mut offset = 0usize;
        for dim in &var.dims {
            let axis = self.coords.get(dim)?;
            let (_, wanted) = at.iter().find(|(d, _)| *d == dim.as_str())?;
            let idx = axis.iter().position(|v| v == wanted)?;
            offset = offset * axis.len() + idx;
        }
        var.values.get(offset).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new()
            .with_coord("model", [0, 1])
            .with_coord("season", [0, 1, 2])
            .with_variable("tas", &["model", "season"], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
            .unwrap()
    }

    #[test]
    fn select_walks_row_major_layout() {
        let ds = sample();
        assert_eq!(ds.select("tas", &[("model", 1.into()), ("season", 2.into())]), Some(6.0));
        assert_eq!(ds.select("tas", &[("season", 0.into()), ("model", 0.into())]), Some(1.0));
        assert_eq!(ds.select("tas", &[("model", 2.into()), ("season", 0.into())]), None);
    }

    #[test]
    fn variable_shape_is_checked() {
        let err = Dataset::new()
            .with_coord("model", [0, 1])
            .with_variable("tas", &["model"], vec![1.0])
            .unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn assign_coord_keeps_length() {
        let mut ds = sample();
        ds.assign_coord("model", vec!["a".into(), "b".into()]).unwrap();
        assert_eq!(ds.coord("model").unwrap()[1], CoordValue::from("b"));
        assert!(ds.assign_coord("model", vec!["a".into()]).is_err());
    }

    #[test]
    fn deserializes_from_json() {
        let ds: Dataset = serde_json::from_value(serde_json::json!({
            "coords": {"scenario": [0, 1], "month": ["Jan", "Feb"]},
            "variables": {"pr": {"dims": ["scenario"], "values": [1.5, 2.5]}}
        }))
        .unwrap();
        assert_eq!(ds.coord("scenario").unwrap(), &[CoordValue::Int(0), CoordValue::Int(1)]);
        assert_eq!(ds.coord("month").unwrap()[0], CoordValue::from("Jan"));
        assert_eq!(ds.variable("pr").unwrap().values, vec![1.5, 2.5]);
    }

    #[test]
    fn malformed_json_dataset_is_rejected() {
        let unknown_dim = serde_json::from_value::<Dataset>(serde_json::json!({
            "coords": {"x": [0, 1, 2]},
            "variables": {"v": {"dims": ["x", "nope"], "values": [1.0]}}
        }))
        .unwrap_err();
        assert!(unknown_dim.to_string().contains("unknown dimension nope"), "{unknown_dim}");

        let ragged = serde_json::from_value::<Dataset>(serde_json::json!({
            "coords": {"x": [0, 1, 2]},
            "variables": {"v": {"dims": ["x"], "values": [1.0, 2.0]}}
        }))
        .unwrap_err();
        assert!(ragged.to_string().contains("expected 3 values, got 2"), "{ragged}");
    }
}
