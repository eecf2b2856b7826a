//! Decoding of the `Encoding` block of a WCS coverage description.
//!
//! Rasdaman coverages store categorical axes (model, scenario, season, ...) as
//! integer codes. The coverage description carries the code tables as
//! dictionary literals inside an `Encoding` element, either one element per
//! dimension:
//!
//! ```xml
//! <Encoding><model>{"0":"GFDL-CM3","1":"NCAR-CCSM4"}</model></Encoding>
//! ```
//!
//! or a single element holding one nested dictionary per dimension.

use std::collections::BTreeMap;
use std::fmt;

use quick_xml::Reader;
use quick_xml::events::Event;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::literal::parse_dict;

const ENCODING_TAG: &[u8] = b"Encoding";

/// Decoded value for an integer code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    Text(String),
    Code(i64),
}

impl Label {
    /// Integer form of the label, if it has one.
    pub fn as_code(&self) -> Option<i64> {
        match self {
            Label::Code(c) => Some(*c),
            Label::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Text(s) => f.write_str(s),
            Label::Code(c) => write!(f, "{c}"),
        }
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Label::Text(value.to_string())
    }
}

impl From<i64> for Label {
    fn from(value: i64) -> Self {
        Label::Code(value)
    }
}

pub type DimensionEncoding = BTreeMap<i64, Label>;

/// Code tables keyed by dimension name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Encodings {
    inner: BTreeMap<String, DimensionEncoding>,
}

impl Encodings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, dimension: &str) -> Option<&DimensionEncoding> {
        self.inner.get(dimension)
    }

    pub fn dimensions(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &DimensionEncoding)> {
        self.inner.iter()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, DimensionEncoding> {
        self.inner
    }
}

impl<K, I> FromIterator<(K, I)> for Encodings
where
    K: Into<String>,
    I: IntoIterator<Item = (i64, Label)>,
{
    fn from_iter<T: IntoIterator<Item = (K, I)>>(iter: T) -> Self {
        Self {
            inner: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into_iter().collect()))
                .collect(),
        }
    }
}

/// Element inside `Encoding` with the text that precedes its first child.
struct Block {
    tag: String,
    text: String,
}

struct Frame {
    block: usize,
    seen_child: bool,
}

/// Parse a coverage description and return the code tables of its first
/// `Encoding` element.
pub fn decode_encodings(document: &str) -> Result<Encodings> {
    let blocks = encoding_blocks(document)?;

    let mut out = Encodings::new();
    for block in &blocks {
        let text = block.text.trim();
        if !(text.starts_with('{') && text.ends_with('}')) {
            continue;
        }

        let dict = parse_dict(text)?;
        let mut flat = Map::new();
        for (key, value) in dict {
            match value {
                Value::Object(nested) => {
                    let encoding = coerce_encoding(&key, nested)?;
                    out.inner.insert(key, encoding);
                }
                other => {
                    flat.insert(key, other);
                }
            }
        }
        if !flat.is_empty() {
            let encoding = coerce_encoding(&block.tag, flat)?;
            out.inner.insert(block.tag.clone(), encoding);
        }
    }

    Ok(out)
}

/// Collect the first `Encoding` element and its descendants in document order.
fn encoding_blocks(document: &str) -> Result<Vec<Block>> {
    let mut reader = Reader::from_str(document);
    let mut blocks: Vec<Block> = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();
    let mut found = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if !found && e.local_name().as_ref() != ENCODING_TAG {
                    continue;
                }
                found = true;
                if let Some(parent) = stack.last_mut() {
                    parent.seen_child = true;
                }
                blocks.push(Block {
                    tag: local_name(e.local_name().as_ref())?,
                    text: String::new(),
                });
                stack.push(Frame {
                    block: blocks.len() - 1,
                    seen_child: false,
                });
            }
            Event::Empty(e) => {
                if !found {
                    if e.local_name().as_ref() == ENCODING_TAG {
                        // `<Encoding/>` has nothing to decode.
                        return Ok(blocks);
                    }
                    continue;
                }
                if let Some(parent) = stack.last_mut() {
                    parent.seen_child = true;
                }
            }
            Event::Text(e) => {
                if let Some(frame) = stack.last() {
                    if !frame.seen_child {
                        blocks[frame.block].text.push_str(&e.unescape()?);
                    }
                }
            }
            Event::CData(e) => {
                if let Some(frame) = stack.last() {
                    if !frame.seen_child {
                        let raw = e.into_inner();
                        blocks[frame.block]
                            .text
                            .push_str(&String::from_utf8_lossy(&raw));
                    }
                }
            }
            Event::End(_) => {
                if stack.pop().is_some() && stack.is_empty() {
                    return Ok(blocks);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if found {
        Err(Error::MalformedDocument(
            "document ended inside the Encoding element".into(),
        ))
    } else {
        Err(Error::MissingEncoding)
    }
}

fn local_name(raw: &[u8]) -> Result<String> {
    std::str::from_utf8(raw)
        .map(|s| s.to_string())
        .map_err(|e| Error::MalformedDocument(format!("element name is not UTF-8: {e}")))
}

fn coerce_encoding(dimension: &str, dict: Map<String, Value>) -> Result<DimensionEncoding> {
    let mut out = DimensionEncoding::new();
    for (key, value) in dict {
        let code: i64 = key.trim().parse().map_err(|_| Error::InvalidCode {
            dimension: dimension.to_string(),
            key: key.clone(),
        })?;
        let label = match value {
            Value::String(s) => Label::Text(s),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Label::Code(i),
                None => Label::Text(n.to_string()),
            },
            other => {
                return Err(Error::InvalidLabel {
                    dimension: dimension.to_string(),
                    code,
                    value: other.to_string(),
                });
            }
        };
        out.insert(code, label);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIBE_COVERAGE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<wcs:CoverageDescriptions xmlns:wcs="http://www.opengis.net/wcs/2.0" xmlns:gml="http://www.opengis.net/gml/3.2">
  <wcs:CoverageDescription gml:id="iem_cru_2km_taspr_seasonal_baseline_stats">
    <gml:metadata>
      <gmlcov:Extension xmlns:gmlcov="http://www.opengis.net/gmlcov/1.0">
        <rasdaman:covMetadata xmlns:rasdaman="http://www.rasdaman.org">
          <Encoding>
            <model>{'0': 'CRU-TS40'}</model>
            <scenario>{'0': 'historical'}</scenario>
            <season>{'0': 'DJF', '1': 'JJA', '2': 'MAM', '3': 'SON'}</season>
            <stat>{'0': 'max', '1': 'mean', '2': 'median', '3': 'min'}</stat>
          </Encoding>
        </rasdaman:covMetadata>
      </gmlcov:Extension>
    </gml:metadata>
  </wcs:CoverageDescription>
</wcs:CoverageDescriptions>"#;

    #[test]
    fn decodes_single_block() {
        let enc =
            decode_encodings(r#"<Encoding><model>{"0":"GFDL-CM3","1":"NCAR-CCSM4"}</model></Encoding>"#)
                .unwrap();
        assert_eq!(enc.len(), 1);
        let model = enc.get("model").unwrap();
        assert_eq!(model.get(&0), Some(&Label::from("GFDL-CM3")));
        assert_eq!(model.get(&1), Some(&Label::from("NCAR-CCSM4")));
    }

    #[test]
    fn decodes_full_coverage_description() {
        let enc = decode_encodings(DESCRIBE_COVERAGE).unwrap();
        assert_eq!(
            enc.dimensions().collect::<Vec<_>>(),
            vec!["model", "scenario", "season", "stat"]
        );
        assert_eq!(enc.get("season").unwrap().get(&3), Some(&Label::from("SON")));
        assert_eq!(enc.get("stat").unwrap().len(), 4);
    }

    #[test]
    fn nested_dictionaries_name_their_own_dimensions() {
        let doc = "<root><Encoding>{'era': {'0': '1950-2009', '1': '2040-2069'}, \
                   'model': {'0': 'GFDL-CM3', '1': 3}}</Encoding></root>";
        let enc = decode_encodings(doc).unwrap();
        assert_eq!(enc.len(), 2);
        assert_eq!(enc.get("era").unwrap().get(&1), Some(&Label::from("2040-2069")));
        assert_eq!(enc.get("model").unwrap().get(&1), Some(&Label::Code(3)));
        assert!(enc.get("Encoding").is_none());
    }

    #[test]
    fn only_first_encoding_element_is_used() {
        let doc = "<r><Encoding><a>{'0': 'x'}</a></Encoding>\
                   <Encoding><b>{'0': 'y'}</b></Encoding></r>";
        let enc = decode_encodings(doc).unwrap();
        assert_eq!(enc.dimensions().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn non_dictionary_text_is_ignored() {
        let doc = "<Encoding><units>mm</units><model>{'0': 'x'}</model><empty/></Encoding>";
        let enc = decode_encodings(doc).unwrap();
        assert_eq!(enc.len(), 1);
    }

    #[test]
    fn missing_encoding_element() {
        assert!(matches!(
            decode_encodings("<CoverageDescription><x>{'0': 'a'}</x></CoverageDescription>"),
            Err(Error::MissingEncoding)
        ));
    }

    #[test]
    fn empty_encoding_element_decodes_to_nothing() {
        assert!(decode_encodings("<r><Encoding/></r>").unwrap().is_empty());
    }

    #[test]
    fn non_integer_key_is_rejected() {
        let err = decode_encodings("<Encoding><model>{'a': 'GFDL-CM3'}</model></Encoding>")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCode { ref dimension, ref key } if dimension == "model" && key == "a"));
    }

    #[test]
    fn malformed_literal_is_fatal() {
        assert!(matches!(
            decode_encodings("<Encoding><model>{'0': 'a', '1': }</model></Encoding>"),
            Err(Error::InvalidLiteral(_))
        ));
    }

    #[test]
    fn truncated_document_is_malformed() {
        assert!(matches!(
            decode_encodings("<r><Encoding><model>{'0': 'a'}</model>"),
            Err(Error::MalformedDocument(_))
        ));
    }

    #[test]
    fn unsupported_labels_are_rejected() {
        for label in ["True", "None", "['a', 'b']"] {
            let doc = format!("<Encoding><model>{{'0': 'a', '1': {label}}}</model></Encoding>");
            let err = decode_encodings(&doc).unwrap_err();
            assert!(
                matches!(err, Error::InvalidLabel { ref dimension, code: 1, .. } if dimension == "model"),
                "{label}: {err}"
            );
        }
    }

    #[test]
    fn later_block_replaces_earlier_dimension() {
        let doc = "<Encoding><model>{'0': 'old', '1': 'gone'}</model>\
                   <model>{'0': 'new'}</model></Encoding>";
        let enc = decode_encodings(doc).unwrap();
        let model = enc.get("model").unwrap();
        assert_eq!(model.len(), 1);
        assert_eq!(model.get(&0), Some(&Label::from("new")));
    }

    #[test]
    fn escaped_xml_text_is_unescaped() {
        let enc = decode_encodings(
            "<Encoding><model>{&quot;0&quot;: &quot;A&amp;B&quot;}</model></Encoding>",
        )
        .unwrap();
        assert_eq!(enc.get("model").unwrap().get(&0), Some(&Label::from("A&B")));
    }
}
