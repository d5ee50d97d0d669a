use std::fmt;

use serde::Serialize;

/// Failures that abort a whole conversion.
#[derive(Debug)]
pub enum ConvertError {
    DocumentParse(String),
    Cancelled,
    InvalidConfiguration(String),
    Io(std::io::Error),
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConvertError::DocumentParse(message) => {
                write!(f, "svg document could not be parsed: {}", message)
            }
            ConvertError::Cancelled => write!(f, "conversion cancelled"),
            ConvertError::InvalidConfiguration(message) => {
                write!(f, "invalid configuration: {}", message)
            }
            ConvertError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConvertError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConvertError {
    fn from(value: std::io::Error) -> Self {
        ConvertError::Io(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Unparseable attribute or path data; the element was skipped.
    ElementParse,
    /// Zero or near-zero extent; the element (or segment) was skipped.
    GeometryDegenerate,
    /// Malformed `transform`; the element kept its parent's matrix.
    TransformParse,
}

impl DiagnosticKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::ElementParse => "element_parse",
            DiagnosticKind::GeometryDegenerate => "geometry_degenerate",
            DiagnosticKind::TransformParse => "transform_parse",
        }
    }
}

/// A non-fatal, per-element problem collected alongside a successful conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub tag: String,
    pub id: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        tag: impl Into<String>,
        id: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            tag: tag.into(),
            id: id.map(str::to_string),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(
                f,
                "{} <{} id=\"{}\">: {}",
                self.kind.as_str(),
                self.tag,
                id,
                self.message
            ),
            None => write!(f, "{} <{}>: {}", self.kind.as_str(), self.tag, self.message),
        }
    }
}
