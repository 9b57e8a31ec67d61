use crate::{
    envelope::{read_metadata, ReplayCompression},
    read_header, read_inputs,
    stage::{ReplayLoadingStage, DEFAULT_BATCH_SIZE},
    Error, Replay, ReplayReader, ReplayType,
};
use std::{io::Read, path::Path};

/// Decodes replays with a fixed configuration.
///
/// ```rust
/// use fafreplay::{ReplayLoader, ReplayType};
/// let loader = ReplayLoader::builder().batch_size(250).build();
/// assert_eq!(loader.batch_size(), 250);
///
/// let stage = loader.stages(b"{}".to_vec(), ReplayType::ForgedAllianceForever);
/// let stage = loader.process(stage)?;
/// assert!(stage.is_terminal());
/// # Ok::<(), fafreplay::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ReplayLoader {
    batch_size: usize,
}

impl Default for ReplayLoader {
    fn default() -> Self {
        ReplayLoader::builder().build()
    }
}

impl ReplayLoader {
    pub fn builder() -> ReplayLoaderBuilder {
        ReplayLoaderBuilder::default()
    }

    /// Number of input records decoded per pipeline step
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Start a resumable decode of the given replay
    pub fn stages(&self, data: Vec<u8>, replay_type: ReplayType) -> ReplayLoadingStage {
        match replay_type {
            ReplayType::Steam => ReplayLoadingStage::scfa(data),
            ReplayType::ForgedAllianceForever => ReplayLoadingStage::new(data),
        }
    }

    /// Advance a resumable decode by one stage
    pub fn process(&self, stage: ReplayLoadingStage) -> Result<ReplayLoadingStage, Error> {
        stage.process(self.batch_size)
    }

    /// Decode a replay written by the game
    pub fn load_scfa(&self, data: &[u8]) -> Result<Replay, Error> {
        let mut reader = ReplayReader::new(data);
        let header = read_header(&mut reader)?;
        let body = read_inputs(&mut reader, None, None)?.into_body();
        log::debug!(
            "decoded replay with {} inputs (in sync: {})",
            body.user_input.len(),
            body.in_sync
        );
        Ok(Replay { header, body })
    }

    /// Decode a replay served by FAForever
    pub fn load_faf(&self, data: &[u8]) -> Result<Replay, Error> {
        let (metadata, offset) = read_metadata(data)?;
        let compression = ReplayCompression::from_metadata(&metadata)?;
        log::debug!(
            "replay {:?} has a {} body",
            metadata.uid,
            compression.name()
        );

        let stream = compression.decompress(&data[offset..])?;
        self.load_scfa(&stream)
    }

    /// Read a replay to the end and decode it
    pub fn load<R: Read>(&self, mut reader: R, replay_type: ReplayType) -> Result<Replay, Error> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        match replay_type {
            ReplayType::Steam => self.load_scfa(&data),
            ReplayType::ForgedAllianceForever => self.load_faf(&data),
        }
    }
}

/// Configures a [`ReplayLoader`]
#[derive(Debug, Clone)]
pub struct ReplayLoaderBuilder {
    batch_size: usize,
}

impl Default for ReplayLoaderBuilder {
    fn default() -> Self {
        ReplayLoaderBuilder {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl ReplayLoaderBuilder {
    /// Set the number of input records decoded per pipeline step. Zero is
    /// treated as one.
    pub fn batch_size(mut self, val: usize) -> ReplayLoaderBuilder {
        self.batch_size = val.max(1);
        self
    }

    pub fn build(self) -> ReplayLoader {
        ReplayLoader {
            batch_size: self.batch_size,
        }
    }
}

/// Decode a `.fafreplay` file
pub fn load_faf_replay_from_disk<P: AsRef<Path>>(path: P) -> Result<Replay, Error> {
    let data = std::fs::read(path)?;
    load_faf_replay_from_slice(&data)
}

/// Decode a `.SCFAReplay` file
pub fn load_scfa_replay_from_disk<P: AsRef<Path>>(path: P) -> Result<Replay, Error> {
    let data = std::fs::read(path)?;
    load_scfa_replay_from_slice(&data)
}

pub fn load_faf_replay_from_slice(data: &[u8]) -> Result<Replay, Error> {
    ReplayLoader::default().load_faf(data)
}

pub fn load_scfa_replay_from_slice(data: &[u8]) -> Result<Replay, Error> {
    ReplayLoader::default().load_scfa(data)
}

/// Decode a replay from a reader
pub fn load_replay_from_stream<R: Read>(reader: R, replay_type: ReplayType) -> Result<Replay, Error> {
    ReplayLoader::default().load(reader, replay_type)
}
