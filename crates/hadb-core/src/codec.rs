//! Credential codecs
//!
//! Stored connection credentials may be encoded; the cluster's codec turns
//! them back into the plain value right before a connection is opened.

use crate::config::CodecKind;
use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::sync::Arc;

/// Encodes and decodes credential values
pub trait Codec: Send + Sync {
    fn decode(&self, value: &str) -> Result<String>;
    fn encode(&self, value: &str) -> Result<String>;
}

/// Pass-through codec
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainCodec;

impl Codec for PlainCodec {
    fn decode(&self, value: &str) -> Result<String> {
        Ok(value.to_string())
    }

    fn encode(&self, value: &str) -> Result<String> {
        Ok(value.to_string())
    }
}

/// Standard-alphabet base64 codec
#[derive(Debug, Default, Clone, Copy)]
pub struct Base64Codec;

impl Codec for Base64Codec {
    fn decode(&self, value: &str) -> Result<String> {
        let bytes = STANDARD
            .decode(value.trim())
            .map_err(|e| Error::Codec(format!("Invalid base64 value: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| Error::Codec(format!("Decoded value is not UTF-8: {}", e)))
    }

    fn encode(&self, value: &str) -> Result<String> {
        Ok(STANDARD.encode(value))
    }
}

/// Build the codec selected by configuration
pub fn create_codec(kind: CodecKind) -> Arc<dyn Codec> {
    match kind {
        CodecKind::Plain => Arc::new(PlainCodec),
        CodecKind::Base64 => Arc::new(Base64Codec),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_codec_is_identity() {
        assert_eq!(PlainCodec.decode("s3cret").unwrap(), "s3cret");
    }

    #[test]
    fn test_base64_decode() {
        assert_eq!(Base64Codec.decode("czNjcmV0").unwrap(), "s3cret");
        assert_eq!(Base64Codec.encode("s3cret").unwrap(), "czNjcmV0");
    }

    #[test]
    fn test_base64_rejects_garbage() {
        let err = Base64Codec.decode("not base64!").unwrap_err();
        assert!(matches!(err, Error::Codec(_)));
    }
}
