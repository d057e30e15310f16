//! Reading and writing the SQRL identity container.
//!
//! ```text
//! "sqrldata" | [u16 length][u16 type][length - 4 bytes] | [u16 length][u16 type]...
//! ```
//!
//! Integers are little-endian and `length` counts the whole block including its
//! own 4 bytes of framing. A file may instead start with `SQRLDATA`, in which
//! case everything after the header is URL-safe base64 without padding.

pub mod fields;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use std::borrow::Cow;
use thiserror::Error;

use crate::models::{Block, Document};
use crate::schema::{BuiltinSchemaSource, SchemaError, SchemaResolver, SchemaSource};

/// Header of a binary identity
pub const HEADER: &[u8; HEADER_LEN] = b"sqrldata";
/// Header of a base64 transport identity
pub const HEADER_BASE64: &[u8; HEADER_LEN] = b"SQRLDATA";
pub const HEADER_LEN: usize = 8;
/// Length and type, in front of every block
pub const FRAMING_LEN: usize = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Invalid header: expected 'sqrldata' or 'SQRLDATA'")]
    InvalidHeader,

    #[error("Invalid base64-format on identity: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("Base64 payload of identity is empty")]
    EmptyPayload,

    #[error("Truncated block framing at offset {offset}: only {available} bytes left")]
    TruncatedFraming { offset: usize, available: usize },

    #[error("Block at offset {offset} declares length {length}, shorter than its framing")]
    BlockTooShort { offset: usize, length: usize },

    #[error("Block at offset {offset} declares length {length} but only {available} bytes remain")]
    BlockOverrun {
        offset: usize,
        length: usize,
        available: usize,
    },

    #[error(
        "Field '{field}' needs {width} bytes at offset {offset} but its block is {block_len} bytes long"
    )]
    FieldOverrun {
        field: String,
        offset: usize,
        width: usize,
        block_len: usize,
    },

    #[error("Field '{field}' starts at offset {offset}, past the block length {length}")]
    RemainingUnderflow {
        field: String,
        offset: usize,
        length: usize,
    },
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("No identity data to decode")]
    EmptyInput,

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// How an identity was, or is to be, written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Transport {
    #[default]
    Binary,
    Base64,
}

impl Transport {
    /// Identify the transport from the header at the start of `bytes`
    pub fn detect(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.starts_with(HEADER) {
            Ok(Transport::Binary)
        } else if bytes.starts_with(HEADER_BASE64) {
            Ok(Transport::Base64)
        } else {
            Err(FormatError::InvalidHeader)
        }
    }

    pub fn header(self) -> &'static [u8; HEADER_LEN] {
        match self {
            Transport::Binary => HEADER,
            Transport::Base64 => HEADER_BASE64,
        }
    }
}

/// Result of [`IdentityCodec::decode`]
#[derive(Debug)]
pub struct Decoded {
    pub document: Document,
    /// Transport the input used, so it can be written back the same way
    pub transport: Transport,
}

/// Decodes identities using schemas from `S`.
///
/// The codec keeps no state between calls and can decode any number of buffers.
#[derive(Debug)]
pub struct IdentityCodec<S> {
    resolver: SchemaResolver<S>,
}

impl IdentityCodec<BuiltinSchemaSource> {
    /// A codec that knows the standard SQRL block types
    pub fn builtin() -> Result<Self, SchemaError> {
        Self::new(BuiltinSchemaSource)
    }
}

impl<S: SchemaSource> IdentityCodec<S> {
    pub fn new(source: S) -> Result<Self, SchemaError> {
        Ok(Self::with_resolver(SchemaResolver::new(source)?))
    }

    pub fn with_resolver(resolver: SchemaResolver<S>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &SchemaResolver<S> {
        &self.resolver
    }

    /// Decode a complete identity.
    ///
    /// Either every block decodes or an error is returned; a partially decoded
    /// document is never handed out.
    pub fn decode(&self, bytes: &[u8]) -> Result<Decoded, CodecError> {
        if bytes.is_empty() {
            return Err(CodecError::EmptyInput);
        }

        let transport = Transport::detect(bytes)?;
        let raw = match transport {
            Transport::Binary => Cow::Borrowed(bytes),
            Transport::Base64 => Cow::Owned(unwrap_base64(bytes)?),
        };

        let document = self.decode_blocks(&raw)?;
        log::debug!(
            "Decoded {} blocks from {} byte identity ({transport:?})",
            document.len(),
            bytes.len()
        );

        Ok(Decoded {
            document,
            transport,
        })
    }

    fn decode_blocks(&self, raw: &[u8]) -> Result<Document, CodecError> {
        let mut blocks = Vec::new();
        let mut offset = HEADER_LEN;

        while offset < raw.len() {
            let available = raw.len() - offset;
            if available < FRAMING_LEN {
                return Err(FormatError::TruncatedFraming { offset, available }.into());
            }

            let length = usize::from(u16::from_le_bytes([raw[offset], raw[offset + 1]]));
            let block_type = u16::from_le_bytes([raw[offset + 2], raw[offset + 3]]);
            if length < FRAMING_LEN {
                return Err(FormatError::BlockTooShort { offset, length }.into());
            }
            if length > available {
                return Err(FormatError::BlockOverrun {
                    offset,
                    length,
                    available,
                }
                .into());
            }

            let resolution = self.resolver.resolve(block_type);
            log::debug!(
                "Block type {block_type} at offset {offset}, {length} bytes{}",
                if resolution.is_fallback { " (unknown)" } else { "" }
            );

            let data = &raw[offset..offset + length];
            blocks.push(fields::decode_block(block_type, data, &resolution.schema)?);

            // Bytes the schema did not account for are skipped
            offset += length;
        }

        Ok(Document::from_blocks(blocks))
    }
}

/// Turn a base64 transport identity into its binary form, header included
fn unwrap_base64(bytes: &[u8]) -> Result<Vec<u8>, FormatError> {
    let payload = bytes[HEADER_LEN..].trim_ascii_end();
    let decoded = URL_SAFE_NO_PAD.decode(payload)?;
    if decoded.is_empty() {
        return Err(FormatError::EmptyPayload);
    }

    let mut raw = Vec::with_capacity(HEADER_LEN + decoded.len());
    raw.extend_from_slice(HEADER);
    raw.extend_from_slice(&decoded);
    Ok(raw)
}

/// Serialize a document with the binary header.
///
/// Fields are written as they are. Length and type framing is not recomputed;
/// see [`Block::sync_framing`].
pub fn encode(document: &Document) -> Vec<u8> {
    let mut out = HEADER.to_vec();
    for block in document.blocks() {
        out.extend_from_slice(&encode_block(block));
    }
    out
}

/// Serialize a document in the given transport
pub fn encode_with(document: &Document, transport: Transport) -> Vec<u8> {
    let binary = encode(document);
    match transport {
        Transport::Binary => binary,
        Transport::Base64 => {
            let mut out = HEADER_BASE64.to_vec();
            out.extend_from_slice(URL_SAFE_NO_PAD.encode(&binary[HEADER_LEN..]).as_bytes());
            out
        }
    }
}

pub(crate) fn encode_block(block: &Block) -> Vec<u8> {
    let mut out = Vec::with_capacity(block.encoded_len());
    for item in block.items() {
        fields::encode_value(item.data(), &mut out);
    }
    out
}
