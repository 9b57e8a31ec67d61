use crate::{Error, ErrorKind};
use serde::{Deserialize, Serialize};

/// The first line of a FAForever replay.
///
/// Only the compression scheme is required to decode the replay; the other
/// well known keys are exposed for convenience and anything else is kept in
/// `extra`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ReplayMetadata {
    #[serde(default)]
    pub compression: Option<String>,
    #[serde(default)]
    pub uid: Option<u64>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub featured_mod: Option<String>,
    #[serde(default)]
    pub mapname: Option<String>,
    #[serde(default)]
    pub map_file_path: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub recorder: Option<String>,
    #[serde(default)]
    pub num_players: Option<u32>,
    #[serde(default)]
    pub launched_at: Option<f64>,
    #[serde(default)]
    pub game_end: Option<f64>,
    #[serde(default)]
    pub complete: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Parse the metadata line at the start of a FAForever replay, returning the
/// metadata and the offset where the compressed body starts.
///
/// ```rust
/// use fafreplay::envelope::read_metadata;
/// let data = b"{\"compression\": \"zstd\", \"uid\": 22338092}\n\x28\xb5\x2f\xfd";
/// let (metadata, body_offset) = read_metadata(&data[..])?;
/// assert_eq!(metadata.compression.as_deref(), Some("zstd"));
/// assert_eq!(metadata.uid, Some(22338092));
/// assert_eq!(&data[body_offset..], b"\x28\xb5\x2f\xfd");
/// # Ok::<(), fafreplay::Error>(())
/// ```
pub fn read_metadata(data: &[u8]) -> Result<(ReplayMetadata, usize), Error> {
    let line_end = data
        .iter()
        .position(|&b| b == b'\n')
        .ok_or_else(|| Error::new(ErrorKind::MetadataMissing))?;

    let metadata = serde_json::from_slice(&data[..line_end])
        .map_err(|e| Error::new(ErrorKind::Metadata(e)))?;
    Ok((metadata, line_end + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_fields() {
        let data = br#"{"uid": 9, "title": "1v1", "featured_mod": "faf", "num_players": 2, "teams": {"1": ["Alpha"], "2": ["Bravo"]}, "launched_at": 1712345678.5, "game_end": null}
body"#;
        let (metadata, offset) = read_metadata(&data[..]).unwrap();
        assert_eq!(&data[offset..], b"body");
        assert_eq!(metadata.compression, None);
        assert_eq!(metadata.title.as_deref(), Some("1v1"));
        assert_eq!(metadata.num_players, Some(2));
        assert_eq!(metadata.launched_at, Some(1712345678.5));
        assert_eq!(metadata.game_end, None);
        assert!(metadata.extra.contains_key("teams"));
    }

    #[test]
    fn test_metadata_missing_newline() {
        let err = read_metadata(&b"{\"uid\": 9}"[..]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MetadataMissing));
    }

    #[test]
    fn test_metadata_invalid_json() {
        let err = read_metadata(&b"{\"uid\": \n"[..]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Metadata(_)));
    }
}
