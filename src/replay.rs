use crate::{ReplayBody, ReplayHeader};
use serde::Serialize;
use std::path::Path;

/// A fully decoded replay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Replay {
    pub header: ReplayHeader,
    pub body: ReplayBody,
}

/// Where a replay was recorded, which determines how it is stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayType {
    /// Written by the game itself (`.SCFAReplay`): the bare replay stream
    Steam,

    /// Served by FAForever (`.fafreplay`): a metadata line and a compressed
    /// replay stream
    ForgedAllianceForever,
}

impl ReplayType {
    /// Guess the replay type from a file's extension
    ///
    /// ```rust
    /// use fafreplay::ReplayType;
    /// assert_eq!(ReplayType::from_path("22338092.fafreplay"), Some(ReplayType::ForgedAllianceForever));
    /// assert_eq!(ReplayType::from_path("balthazar-01.SCFAReplay"), Some(ReplayType::Steam));
    /// assert_eq!(ReplayType::from_path("notes.txt"), None);
    /// ```
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<ReplayType> {
        let extension = path.as_ref().extension()?.to_str()?;
        if extension.eq_ignore_ascii_case("fafreplay") {
            Some(ReplayType::ForgedAllianceForever)
        } else if extension.eq_ignore_ascii_case("scfareplay") {
            Some(ReplayType::Steam)
        } else {
            None
        }
    }
}
