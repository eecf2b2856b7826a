use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no Encoding element in coverage description")]
    MissingEncoding,

    #[error("malformed coverage description: {0}")]
    MalformedDocument(String),

    #[error("encoding key {key:?} of dimension {dimension} is not an integer")]
    InvalidCode { dimension: String, key: String },

    #[error("unsupported label for code {code} of dimension {dimension}: {value}")]
    InvalidLabel {
        dimension: String,
        code: i64,
        value: String,
    },

    #[error("invalid dictionary literal: {0}")]
    InvalidLiteral(String),

    #[error("no encoding for value {value} on dimension {dimension}")]
    MissingCode { dimension: String, value: String },

    #[error("shape mismatch for {name}: expected {expected} values, got {actual}")]
    ShapeMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unsupported CRS: EPSG:{0} (supported: 4326, 3338)")]
    UnsupportedCrs(u32),

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("no data returned for {0}")]
    NoData(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),
}
