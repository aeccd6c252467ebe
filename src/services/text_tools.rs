//! Text transforms: base64, hashes, URL encoding and JSON formatting.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use thiserror::Error;

static PERCENT_ESCAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%[0-9A-Fa-f]{2}").expect("valid regex"));

/// Longest single-line preview shown for formatted JSON.
pub const PREVIEW_CHARS: usize = 120;

/// A text transform selected by its query prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextTool {
    Base64Encode,
    Base64Decode,
    Md5,
    Sha256,
    Url,
    Json,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TextToolError {
    #[error("decode failed: {0}")]
    DecodeFailed(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(String),
}

/// Output of a successful transform.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOutput {
    /// Full transformed text
    pub text: String,
    /// What happened, e.g. "URL decoded"
    pub label: &'static str,
}

impl TextTool {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "base64" => Some(Self::Base64Encode),
            "base64d" => Some(Self::Base64Decode),
            "md5" => Some(Self::Md5),
            "sha256" => Some(Self::Sha256),
            "url" => Some(Self::Url),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Base64Encode => "base64",
            Self::Base64Decode => "base64d",
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
            Self::Url => "url",
            Self::Json => "json",
        }
    }

    pub fn apply(self, input: &str) -> Result<TextOutput, TextToolError> {
        match self {
            Self::Base64Encode => Ok(TextOutput {
                text: STANDARD.encode(input.as_bytes()),
                label: "Base64 encoded",
            }),
            Self::Base64Decode => {
                let bytes = STANDARD
                    .decode(input.trim())
                    .map_err(|e| TextToolError::DecodeFailed(e.to_string()))?;
                let text = String::from_utf8(bytes)
                    .map_err(|_| TextToolError::DecodeFailed("not valid UTF-8".to_string()))?;
                Ok(TextOutput {
                    text,
                    label: "Base64 decoded",
                })
            }
            Self::Md5 => Ok(TextOutput {
                text: format!("{:x}", md5::compute(input.as_bytes())),
                label: "MD5",
            }),
            Self::Sha256 => Ok(TextOutput {
                text: hex::encode(Sha256::digest(input.as_bytes())),
                label: "SHA-256",
            }),
            Self::Url => {
                if PERCENT_ESCAPE.is_match(input) {
                    let decoded = urlencoding::decode(input)
                        .map_err(|e| TextToolError::DecodeFailed(e.to_string()))?;
                    Ok(TextOutput {
                        text: decoded.into_owned(),
                        label: "URL decoded",
                    })
                } else {
                    Ok(TextOutput {
                        text: urlencoding::encode(input).into_owned(),
                        label: "URL encoded",
                    })
                }
            }
            Self::Json => {
                let value: serde_json::Value = serde_json::from_str(input)
                    .map_err(|e| TextToolError::InvalidJson(e.to_string()))?;
                let text = serde_json::to_string_pretty(&value)
                    .map_err(|e| TextToolError::InvalidJson(e.to_string()))?;
                Ok(TextOutput {
                    text,
                    label: "JSON formatted",
                })
            }
        }
    }
}

/// Collapse `text` to one line and cut it at `max_chars` with an ellipsis.
pub fn single_line_preview(text: &str, max_chars: usize) -> String {
    let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.chars().count() <= max_chars {
        return line;
    }
    let mut preview: String = line.chars().take(max_chars).collect();
    preview.push('…');
    preview
}
