//! Stream configuration via `vercodec.toml`
//!
//! Tools that read a family of container files share one set of stream
//! defaults: byte order, text encoding and how malformed text is handled.
//! [`CodecConfig`] holds them and builds configured readers and writers.

use crate::reader::{EndianReader, ReadSeek};
use crate::writer::{EndianWriter, WriteSeek};
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use vercodec_core::{ByteOrder, Error, Result};

/// Conventional config file name
pub const CONFIG_FILE_NAME: &str = "vercodec.toml";

/// Stream configuration loaded from `vercodec.toml`.
///
/// # Example
///
/// ```toml
/// # Default byte order: "little" or "big"
/// byte_order = "big"
///
/// # Text encoding label (WHATWG), e.g. "utf-8", "windows-1252", "shift_jis"
/// encoding = "utf-8"
///
/// # Reject malformed or unmappable text instead of substituting
/// strict_text = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Byte order for fields without an override
    #[serde(default)]
    pub byte_order: ByteOrder,
    /// Text encoding label
    #[serde(default = "default_encoding")]
    pub encoding: String,
    /// Whether malformed text is an error
    #[serde(default)]
    pub strict_text: bool,
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            byte_order: ByteOrder::LittleEndian,
            encoding: default_encoding(),
            strict_text: false,
        }
    }
}

impl CodecConfig {
    /// Set the default byte order
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    /// Set the text encoding label
    pub fn with_encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = label.into();
        self
    }

    /// Set strict text handling
    pub fn with_strict_text(mut self, strict: bool) -> Self {
        self.strict_text = strict;
        self
    }

    /// Resolve the encoding label.
    ///
    /// # Errors
    ///
    /// Returns an error if the label is unknown, or names an encoding that
    /// cannot be written back byte-for-byte (UTF-16 and other non
    /// ASCII-compatible encodings, or decode-only encodings).
    pub fn text_encoding(&self) -> Result<&'static Encoding> {
        let encoding = Encoding::for_label(self.encoding.trim().as_bytes()).ok_or_else(|| {
            Error::InvalidConfig(format!("unknown text encoding '{}'", self.encoding))
        })?;
        if !encoding.is_ascii_compatible() || encoding.output_encoding() != encoding {
            return Err(Error::InvalidConfig(format!(
                "text encoding '{}' cannot be used for binary string fields",
                encoding.name()
            )));
        }
        Ok(encoding)
    }

    /// Validate all settings
    pub fn validate(&self) -> Result<()> {
        self.text_encoding().map(|_| ())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# vercodec stream configuration
#
# Default byte order for fields without an explicit override: "little" or "big"
byte_order = "little"

# Text encoding label for string fields (WHATWG labels, e.g. "utf-8",
# "windows-1252", "shift_jis"). Must be ASCII-compatible.
encoding = "utf-8"

# true  = malformed or unmappable text is an error
# false = malformed text decodes to U+FFFD (default)
strict_text = false
"#
    }

    /// Parse config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be parsed or fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: CodecConfig = toml::from_str(content)
            .map_err(|e| Error::InvalidConfig(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), byte_order = %config.byte_order, encoding = %config.encoding, "Loaded codec config");
        Ok(config)
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::InvalidConfig(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reader over `inner` with this configuration
    pub fn reader<'a>(&self, inner: impl ReadSeek + 'a) -> Result<EndianReader<'a>> {
        Ok(EndianReader::new(inner, self.byte_order)
            .with_encoding(self.text_encoding()?)
            .with_strict_text(self.strict_text))
    }

    /// Writer over `inner` with this configuration
    pub fn writer<'a>(&self, inner: impl WriteSeek + 'a) -> Result<EndianWriter<'a>> {
        Ok(EndianWriter::new(inner, self.byte_order)
            .with_encoding(self.text_encoding()?)
            .with_strict_text(self.strict_text))
    }
}
