use std::fs;
use std::path::{Path, PathBuf};

use crate::codec::{self, CodecError, Decoded, IdentityCodec, Transport};
use crate::models::Document;
use crate::schema::SchemaSource;

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("No file path given")]
    EmptyPath,
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Read and decode an identity file
pub fn load_from_path<S: SchemaSource>(
    codec: &IdentityCodec<S>,
    path: &Path,
) -> Result<Decoded, IoError> {
    if path.as_os_str().is_empty() {
        return Err(IoError::EmptyPath);
    }
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }

    let bytes = fs::read(path)?;
    log::debug!("Read {} bytes from {}", bytes.len(), path.display());
    load_from_bytes(codec, &bytes)
}

/// Decode an identity already held in memory
pub fn load_from_bytes<S: SchemaSource>(
    codec: &IdentityCodec<S>,
    bytes: &[u8],
) -> Result<Decoded, IoError> {
    Ok(codec.decode(bytes)?)
}

/// Encode a document and write it to `path`, marking it clean.
///
/// Parent directories are created as needed. A document with no blocks is
/// always written in binary transport, since a bare base64 header cannot be
/// read back. Returns the transport actually written.
pub fn save_to_path(
    document: &mut Document,
    path: &Path,
    transport: Transport,
) -> Result<Transport, IoError> {
    if path.as_os_str().is_empty() {
        return Err(IoError::EmptyPath);
    }

    let transport = match transport {
        Transport::Base64 if document.is_empty() => {
            log::warn!(
                "{} has no blocks, writing binary transport instead of base64",
                path.display()
            );
            Transport::Binary
        }
        transport => transport,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let bytes = codec::encode_with(document, transport);
    fs::write(path, &bytes)?;
    document.mark_clean();

    log::info!(
        "Saved {} blocks to {} ({transport:?}, {} bytes)",
        document.len(),
        path.display(),
        bytes.len()
    );
    Ok(transport)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{FormatError, HEADER_BASE64};
    use crate::tests::{
        create_test_dir, create_test_file, identity, previous_keys_block, rescue_code_block,
        summary, test_codec,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_identity_file() {
        // Given an identity file on disk
        let dir = create_test_dir();
        let bytes = identity(&[rescue_code_block(), previous_keys_block(1)]);
        let path = create_test_file(&dir, "identity.sqrl", &bytes);

        // When loading it
        let decoded = load_from_path(&test_codec(), &path).unwrap();

        // Then every block is decoded
        assert_eq!(decoded.document.len(), 2);
        assert_eq!(decoded.transport, Transport::Binary);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = create_test_dir();
        let path = dir.path().join("missing.sqrl");

        let result = load_from_path(&test_codec(), &path);

        assert!(matches!(result, Err(IoError::NotFound(p)) if p == path));
    }

    #[test]
    fn test_load_empty_path() {
        let result = load_from_path(&test_codec(), Path::new(""));
        assert!(matches!(result, Err(IoError::EmptyPath)));
    }

    #[test]
    fn test_load_file_with_bad_header() {
        let dir = create_test_dir();
        let path = create_test_file(&dir, "notes.txt", b"not an identity");

        let result = load_from_path(&test_codec(), &path);

        assert!(matches!(
            result,
            Err(IoError::Codec(CodecError::Format(FormatError::InvalidHeader)))
        ));
    }

    #[test]
    fn test_save_creates_parent_directories_and_marks_clean() {
        // Given an edited document
        let codec = test_codec();
        let bytes = identity(&[rescue_code_block(), previous_keys_block(2)]);
        let mut doc = load_from_bytes(&codec, &bytes).unwrap().document;
        let first = doc.blocks()[0].id();
        doc.delete_block(first);
        assert!(doc.is_dirty());

        // When saving into a directory that does not exist yet
        let dir = create_test_dir();
        let path = dir.path().join("backup").join("identity.sqrl");
        save_to_path(&mut doc, &path, Transport::Binary).unwrap();

        // Then the file holds the edited document and the document is clean
        assert!(!doc.is_dirty());
        assert_eq!(fs::read(&path).unwrap(), identity(&[previous_keys_block(2)]));
    }

    #[test]
    fn test_save_base64_and_reload() {
        let codec = test_codec();
        let mut doc = load_from_bytes(&codec, &identity(&[rescue_code_block()]))
            .unwrap()
            .document;

        let dir = create_test_dir();
        let path = dir.path().join("identity.txt");
        save_to_path(&mut doc, &path, Transport::Base64).unwrap();

        let written = fs::read(&path).unwrap();
        assert!(written.starts_with(HEADER_BASE64));

        let reloaded = load_from_path(&codec, &path).unwrap();
        assert_eq!(reloaded.transport, Transport::Base64);
        assert_eq!(summary(&reloaded.document), summary(&doc));
    }

    #[test]
    fn test_save_empty_document_as_base64_stays_readable() {
        // Given a document whose only block was deleted
        let codec = test_codec();
        let mut doc = load_from_bytes(&codec, &identity(&[rescue_code_block()]))
            .unwrap()
            .document;
        let only = doc.blocks()[0].id();
        doc.delete_block(only);

        // When saving it in base64 transport
        let dir = create_test_dir();
        let path = dir.path().join("identity.txt");
        let written = save_to_path(&mut doc, &path, Transport::Base64).unwrap();

        // Then binary is written and the file loads as an empty identity
        assert_eq!(written, Transport::Binary);
        assert_eq!(fs::read(&path).unwrap(), b"sqrldata");
        let reloaded = load_from_path(&codec, &path).unwrap();
        assert!(reloaded.document.is_empty());
        assert!(!doc.is_dirty());
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let dir = create_test_dir();
        let path = create_test_file(&dir, "identity.sqrl", b"old contents");
        let codec = test_codec();
        let mut doc = load_from_bytes(&codec, &identity(&[rescue_code_block()]))
            .unwrap()
            .document;

        save_to_path(&mut doc, &path, Transport::Binary).unwrap();

        assert_eq!(fs::read(&path).unwrap(), identity(&[rescue_code_block()]));
    }
}
