use std::fmt;

/// An error that can occur when decoding a replay
#[derive(Debug)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Error {
        Error(Box::new(kind))
    }

    /// Return the specific type of error
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Consume the error and return the specific type of error
    #[must_use]
    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    /// Returns the byte offset into the decompressed stream that the error
    /// occurs (if available)
    pub fn offset(&self) -> Option<usize> {
        self.0.offset()
    }
}

/// Specific type of error
#[derive(Debug)]
pub enum ErrorKind {
    /// Unexpected end of input
    Eof { offset: usize },

    /// No newline terminated metadata line at the start of a FAF replay
    MetadataMissing,

    /// The metadata line is not valid metadata json
    Metadata(serde_json::Error),

    /// The metadata names a compression scheme that is not gzip or zstd
    UnknownCompression(String),

    /// The gzip flavored body is not valid base64
    Base64(base64::DecodeError),

    /// The compressed body could not be inflated
    Decompression(std::io::Error),

    /// The replay version and scenario path are not separated by a CRLF
    MalformedReplayVersion { offset: usize },

    /// The scenario is a lua value other than a table
    ScenarioNotTable { offset: usize },

    /// An input record with an unrecognized type tag was encountered
    UnknownInputType { input_type: u8, offset: usize },

    /// A lua value with an unrecognized type tag was encountered
    UnknownLuaType { lua_type: u8, offset: usize },

    /// Lua tables are nested deeper than the decoder allows
    LuaDepthExceeded { offset: usize },

    /// A lua table is keyed by a value that can't be used as a key
    InvalidLuaKey { offset: usize },

    /// A command references a negative number of units
    InvalidUnitCount { count: i32, offset: usize },

    /// An error reading the replay from disk or a stream
    Io(std::io::Error),
}

impl ErrorKind {
    pub fn offset(&self) -> Option<usize> {
        match *self {
            ErrorKind::Eof { offset } => Some(offset),
            ErrorKind::MalformedReplayVersion { offset } => Some(offset),
            ErrorKind::ScenarioNotTable { offset } => Some(offset),
            ErrorKind::UnknownInputType { offset, .. } => Some(offset),
            ErrorKind::UnknownLuaType { offset, .. } => Some(offset),
            ErrorKind::LuaDepthExceeded { offset } => Some(offset),
            ErrorKind::InvalidLuaKey { offset } => Some(offset),
            ErrorKind::InvalidUnitCount { offset, .. } => Some(offset),
            _ => None,
        }
    }

    /// Returns true for errors that the staged loader reports as a failed
    /// stage instead of an error
    pub(crate) fn is_envelope(&self) -> bool {
        matches!(
            self,
            ErrorKind::MetadataMissing
                | ErrorKind::Metadata(_)
                | ErrorKind::UnknownCompression(_)
                | ErrorKind::Base64(_)
                | ErrorKind::Decompression(_)
        )
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self.0 {
            ErrorKind::Metadata(ref err) => Some(err),
            ErrorKind::Base64(ref err) => Some(err),
            ErrorKind::Decompression(ref err) => Some(err),
            ErrorKind::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self.0 {
            ErrorKind::Eof { offset } => {
                write!(f, "unexpected end of file (offset: {})", offset)
            }
            ErrorKind::MetadataMissing => write!(f, "no metadata found"),
            ErrorKind::Metadata(ref err) => write!(f, "invalid metadata: {}", err),
            ErrorKind::UnknownCompression(ref name) => {
                write!(f, "unknown replay compression: {}", name)
            }
            ErrorKind::Base64(ref err) => write!(f, "decompression failed: {}", err),
            ErrorKind::Decompression(ref err) => write!(f, "decompression failed: {}", err),
            ErrorKind::MalformedReplayVersion { offset } => write!(
                f,
                "expected replay version and scenario path separated by a newline (offset: {})",
                offset
            ),
            ErrorKind::ScenarioNotTable { offset } => {
                write!(f, "scenario is not a table (offset: {})", offset)
            }
            ErrorKind::UnknownInputType { input_type, offset } => write!(
                f,
                "unknown replay input type encountered (type: {}, offset: {})",
                input_type, offset
            ),
            ErrorKind::UnknownLuaType { lua_type, offset } => write!(
                f,
                "unknown lua type encountered (type: {}, offset: {})",
                lua_type, offset
            ),
            ErrorKind::LuaDepthExceeded { offset } => {
                write!(f, "lua tables nested too deeply (offset: {})", offset)
            }
            ErrorKind::InvalidLuaKey { offset } => {
                write!(f, "lua table key is not a scalar (offset: {})", offset)
            }
            ErrorKind::InvalidUnitCount { count, offset } => write!(
                f,
                "command references a negative number of units (count: {}, offset: {})",
                count, offset
            ),
            ErrorKind::Io(ref err) => write!(f, "io error: {}", err),
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::new(ErrorKind::Io(error))
    }
}
