use tracing::debug;

use crate::dataset::{CoordValue, Dataset};
use crate::encoding::{Encodings, Label};
use crate::error::{Error, Result};

/// Replace the integer codes on every encoded axis of `dataset` with their
/// decoded labels.
///
/// Dimensions of `encodings` that are not axes of `dataset` are skipped. When
/// every decoded value on an axis reads as an integer (intermediate
/// re-encodings), the axis keeps integer coordinates; otherwise it takes the
/// labels as they are.
pub fn assign_coordinate_labels(encodings: &Encodings, dataset: &Dataset) -> Result<Dataset> {
    let mut out = dataset.clone();

    for (dim, encoding) in encodings.iter() {
        let Some(raw) = dataset.coord(dim) else {
            continue;
        };

        let mut labels: Vec<&Label> = Vec::with_capacity(raw.len());
        for value in raw {
            let label = match value {
                CoordValue::Int(code) => encoding.get(code),
                CoordValue::Label(_) => None,
            };
            let label = label.ok_or_else(|| Error::MissingCode {
                dimension: dim.clone(),
                value: value.to_string(),
            })?;
            labels.push(label);
        }

        let codes: Option<Vec<i64>> = labels.iter().map(|l| l.as_code()).collect();
        let new_coords: Vec<CoordValue> = match codes {
            Some(codes) => codes.into_iter().map(CoordValue::Int).collect(),
            None => labels
                .into_iter()
                .map(|l| match l {
                    Label::Text(s) => CoordValue::Label(s.clone()),
                    Label::Code(c) => CoordValue::Int(*c),
                })
                .collect(),
        };

        debug!(dimension = %dim, values = new_coords.len(), "assigned coordinate labels");
        out.assign_coord(dim, new_coords)?;
    }

    Ok(out)
}

impl Dataset {
    /// See [`assign_coordinate_labels`].
    pub fn labeled(&self, encodings: &Encodings) -> Result<Dataset> {
        assign_coordinate_labels(encodings, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encodings() -> Encodings {
        Encodings::from_iter([
            (
                "model",
                vec![(0, Label::from("GFDL-CM3")), (1, Label::from("NCAR-CCSM4"))],
            ),
            ("scenario", vec![(0, Label::from("5")), (1, Label::from("7"))]),
            ("era", vec![(0, Label::from("1950-2009"))]),
        ])
    }

    #[test]
    fn replaces_codes_with_labels() {
        let ds = Dataset::new().with_coord("model", [0]);
        let enc = Encodings::from_iter([("model", vec![(0, Label::from("GFDL-CM3"))])]);
        let out = assign_coordinate_labels(&enc, &ds).unwrap();
        assert_eq!(out.coord("model").unwrap(), &[CoordValue::from("GFDL-CM3")]);
    }

    #[test]
    fn numeric_labels_become_integers() {
        let ds = Dataset::new().with_coord("scenario", [1, 0]);
        let out = ds.labeled(&encodings()).unwrap();
        assert_eq!(out.coord("scenario").unwrap(), &[CoordValue::Int(7), CoordValue::Int(5)]);
    }

    #[test]
    fn mixed_axis_keeps_labels() {
        let enc = Encodings::from_iter([(
            "model",
            vec![(0, Label::from("GFDL-CM3")), (1, Label::from("5"))],
        )]);
        let ds = Dataset::new().with_coord("model", [0, 1]);
        let out = ds.labeled(&enc).unwrap();
        assert_eq!(
            out.coord("model").unwrap(),
            &[CoordValue::from("GFDL-CM3"), CoordValue::from("5")]
        );
    }

    #[test]
    fn missing_code_is_an_error() {
        let ds = Dataset::new().with_coord("model", [0, 2]);
        let err = ds.labeled(&encodings()).unwrap_err();
        assert!(matches!(err, Error::MissingCode { ref dimension, ref value } if dimension == "model" && value == "2"));
    }

    #[test]
    fn leaves_other_axes_and_input_untouched() {
        let ds = Dataset::new()
            .with_coord("model", [1])
            .with_coord("x", [100, 200])
            .with_variable("tas", &["model", "x"], vec![-3.5, -2.0])
            .unwrap();
        let out = ds.labeled(&encodings()).unwrap();
        assert_eq!(out.coord("model").unwrap(), &[CoordValue::from("NCAR-CCSM4")]);
        assert_eq!(out.coord("x").unwrap(), ds.coord("x").unwrap());
        assert_eq!(ds.coord("model").unwrap(), &[CoordValue::Int(1)]);
        assert_eq!(
            out.select("tas", &[("model", "NCAR-CCSM4".into()), ("x", 200.into())]),
            Some(-2.0)
        );
    }

    #[test]
    fn decoded_document_labels_dataset() {
        let enc = crate::encoding::decode_encodings(
            r#"<Encoding><model>{"0":"GFDL-CM3","1":"NCAR-CCSM4"}</model></Encoding>"#,
        )
        .unwrap();
        let ds = Dataset::new().with_coord("model", [1, 0]);
        let out = ds.labeled(&enc).unwrap();
        assert_eq!(
            out.coord("model").unwrap(),
            &[CoordValue::from("NCAR-CCSM4"), CoordValue::from("GFDL-CM3")]
        );
    }
}
