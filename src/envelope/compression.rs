use crate::{envelope::ReplayMetadata, Error, ErrorKind};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use flate2::read::ZlibDecoder;
use std::io::Read;

/// Upper bound on the buffer reserved from the declared uncompressed size
const MAX_RESERVE: usize = 64 * 1024 * 1024;

/// How the body of a FAForever replay is compressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayCompression {
    /// base64 text of a length prefixed zlib stream
    Gzip,

    /// raw zstd frame
    Zstd,
}

impl ReplayCompression {
    /// Creates a compression from its metadata name
    pub fn from_name(name: &str) -> Result<Self, Error> {
        match name {
            "gzip" => Ok(ReplayCompression::Gzip),
            "zstd" => Ok(ReplayCompression::Zstd),
            x => Err(Error::new(ErrorKind::UnknownCompression(x.to_string()))),
        }
    }

    /// The compression declared by the metadata. Replays recorded before the
    /// key was introduced are gzip.
    pub fn from_metadata(metadata: &ReplayMetadata) -> Result<Self, Error> {
        metadata
            .compression
            .as_deref()
            .map_or(Ok(ReplayCompression::Gzip), ReplayCompression::from_name)
    }

    /// Returns the name used in the metadata
    pub fn name(&self) -> &'static str {
        match self {
            ReplayCompression::Gzip => "gzip",
            ReplayCompression::Zstd => "zstd",
        }
    }

    /// Decompress the body of a replay into the engine's replay stream
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        match self {
            ReplayCompression::Gzip => inflate_base64(data),
            ReplayCompression::Zstd => {
                zstd::stream::decode_all(data).map_err(|e| Error::new(ErrorKind::Decompression(e)))
            }
        }
    }
}

fn inflate_base64(data: &[u8]) -> Result<Vec<u8>, Error> {
    let text: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD
        .decode(text)
        .map_err(|e| Error::new(ErrorKind::Base64(e)))?;

    let Some((prefix, zlib)) = bytes.split_first_chunk::<4>() else {
        let err = std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "body is shorter than its length prefix",
        );
        return Err(Error::new(ErrorKind::Decompression(err)));
    };

    let declared = u32::from_be_bytes(*prefix) as usize;
    let mut out = Vec::with_capacity(declared.min(MAX_RESERVE));
    ZlibDecoder::new(zlib)
        .read_to_end(&mut out)
        .map_err(|e| Error::new(ErrorKind::Decompression(e)))?;
    Ok(out)
}
