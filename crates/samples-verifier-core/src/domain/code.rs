//! Code units and the document formats they are extracted from.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::VerifierError;

/// The literal source text of one extracted snippet.
///
/// Two code units with the same text are the same code unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Code(String);

impl Code {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Code {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Code {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// Document format to scan for snippets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Markdown,
    Html,
}

impl FileType {
    /// The exact file extension (without the dot) a document must carry.
    pub fn extension(self) -> &'static str {
        match self {
            FileType::Markdown => "md",
            FileType::Html => "html",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::Markdown => f.write_str("markdown"),
            FileType::Html => f.write_str("html"),
        }
    }
}

impl FromStr for FileType {
    type Err = VerifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md" | "markdown" => Ok(FileType::Markdown),
            "html" => Ok(FileType::Html),
            other => Err(VerifierError::InvalidConfig(format!(
                "unknown file type: {other} (expected md or html)"
            ))),
        }
    }
}
