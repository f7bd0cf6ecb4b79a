//! On-disk record framing for the flat-file store.
//!
//! A record is the paste name, one `\n` separator, then the content bytes
//! verbatim. Only the first separator is significant, so content may begin
//! with or contain any number of newlines.

use crate::error::AppError;

/// Reserved byte between the name and the content.
pub const RECORD_SEPARATOR: u8 = b'\n';

/// Encode a record.
///
/// # Errors
/// Returns [`AppError::InvalidName`] when `name` contains the separator.
pub fn encode_record(name: &str, content: &str) -> Result<Vec<u8>, AppError> {
    if name.as_bytes().contains(&RECORD_SEPARATOR) {
        return Err(AppError::InvalidName(format!(
            "{:?} contains the record separator",
            name
        )));
    }
    let mut bytes = Vec::with_capacity(name.len() + 1 + content.len());
    bytes.extend_from_slice(name.as_bytes());
    bytes.push(RECORD_SEPARATOR);
    bytes.extend_from_slice(content.as_bytes());
    Ok(bytes)
}

/// Split a record into `(name, content)`.
///
/// A record without a separator is a name with empty content.
///
/// # Errors
/// Returns [`AppError::StorageUnavailable`] when either part is not UTF-8.
pub fn decode_record(bytes: &[u8]) -> Result<(String, String), AppError> {
    let (name, content) = match bytes.iter().position(|b| *b == RECORD_SEPARATOR) {
        Some(at) => (&bytes[..at], &bytes[at + 1..]),
        None => (bytes, &bytes[bytes.len()..]),
    };
    let name = std::str::from_utf8(name)
        .map_err(|err| AppError::StorageUnavailable(format!("Record name is not UTF-8: {}", err)))?;
    let content = std::str::from_utf8(content).map_err(|err| {
        AppError::StorageUnavailable(format!("Record content is not UTF-8: {}", err))
    })?;
    Ok((name.to_string(), content.to_string()))
}

/// Decode only the name from the first line of a record.
pub fn decode_name(first_line: &[u8]) -> Option<String> {
    let line = first_line
        .strip_suffix(&[RECORD_SEPARATOR])
        .unwrap_or(first_line);
    std::str::from_utf8(line).ok().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_with_leading_newlines_survives() {
        let bytes = encode_record("notes", "\n\nbody\nmore\n").expect("encode");
        assert_eq!(bytes, b"notes\n\n\nbody\nmore\n");
        let (name, content) = decode_record(&bytes).expect("decode");
        assert_eq!(name, "notes");
        assert_eq!(content, "\n\nbody\nmore\n");
    }

    #[test]
    fn empty_content_and_missing_separator_decode_to_empty_body() {
        let (name, content) = decode_record(b"solo\n").expect("decode");
        assert_eq!((name.as_str(), content.as_str()), ("solo", ""));

        let (name, content) = decode_record(b"solo").expect("decode");
        assert_eq!((name.as_str(), content.as_str()), ("solo", ""));
    }

    #[test]
    fn separator_in_name_is_rejected() {
        assert!(matches!(
            encode_record("bad\nname", "x"),
            Err(AppError::InvalidName(_))
        ));
    }

    #[test]
    fn non_utf8_content_is_reported() {
        let err = decode_record(b"name\n\xff\xfe").expect_err("invalid utf-8");
        assert!(matches!(err, AppError::StorageUnavailable(ref m) if m.contains("content")));
    }

    #[test]
    fn decode_name_strips_only_the_separator() {
        assert_eq!(decode_name(b"foo/bar\n").as_deref(), Some("foo/bar"));
        assert_eq!(decode_name(b"foo/bar").as_deref(), Some("foo/bar"));
        assert_eq!(decode_name(b"\xff\n"), None);
    }
}
