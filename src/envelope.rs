//! The FAForever replay envelope.
//!
//! Replays stored by FAForever (`.fafreplay`) wrap the engine's replay stream:
//!
//! 1. Metadata - a single line of JSON describing the game (title, map,
//!    players, compression) terminated by a newline
//! 2. Body - the replay stream as written by the engine, compressed
//!
//! Two compression schemes exist. Older replays use Qt's `qCompress` output
//! (a 4 byte big endian length followed by a zlib stream) encoded as base64
//! text. Newer replays declare `"compression": "zstd"` in the metadata and
//! store a raw zstd frame.
//!
//! Replays written by the game itself (`.SCFAReplay`) have no envelope.

mod compression;
mod metadata;

pub use compression::*;
pub use metadata::*;
