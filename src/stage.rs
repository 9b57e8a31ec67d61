//! Resumable replay decoding.
//!
//! Decoding a replay is split into stages so that a host can spread the work
//! over several calls (eg: to report progress or to stay responsive). Each
//! stage owns the bytes it still needs and everything decoded so far;
//! processing a stage consumes it and returns the next one.
//!
//! ```text
//! NotStarted -> WithMetadata -> Decompressed -> WithScenario -> AtInput* -> Complete
//! ```
//!
//! SCFA replays have no envelope and enter the pipeline at `Decompressed`.
//! A FAForever replay with an unreadable envelope moves to `Failed`, while a
//! corrupt replay stream is reported as an error.

use crate::{
    envelope::{read_metadata, ReplayCompression, ReplayMetadata},
    read_header, read_inputs, Error, Replay, ReplayBody, ReplayBodyInvariant, ReplayHeader,
    ReplayReader,
};

/// Number of input records decoded per step unless configured otherwise
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Turn envelope errors into a failed stage and propagate the rest
fn envelope_failure(err: Error) -> Result<ReplayLoadingStage, Error> {
    if err.kind().is_envelope() {
        Ok(ReplayLoadingStage::Failed(err))
    } else {
        Err(err)
    }
}

/// The raw bytes of a FAForever replay
#[derive(Debug, Clone)]
pub struct NotStarted {
    data: Vec<u8>,
}

impl NotStarted {
    pub fn new(data: Vec<u8>) -> Self {
        NotStarted { data }
    }

    /// Parse the metadata line
    pub fn process(self, _batch_size: usize) -> Result<ReplayLoadingStage, Error> {
        match read_metadata(&self.data) {
            Ok((metadata, offset)) => Ok(ReplayLoadingStage::WithMetadata(WithMetadata {
                data: self.data,
                offset,
                metadata,
            })),
            Err(e) => envelope_failure(e),
        }
    }
}

/// A FAForever replay whose metadata has been parsed
#[derive(Debug, Clone)]
pub struct WithMetadata {
    data: Vec<u8>,
    offset: usize,
    metadata: ReplayMetadata,
}

impl WithMetadata {
    pub fn metadata(&self) -> &ReplayMetadata {
        &self.metadata
    }

    /// Decompress the replay stream
    pub fn process(self, _batch_size: usize) -> Result<ReplayLoadingStage, Error> {
        let decompressed = ReplayCompression::from_metadata(&self.metadata)
            .and_then(|compression| compression.decompress(&self.data[self.offset..]));

        match decompressed {
            Ok(data) => Ok(ReplayLoadingStage::Decompressed(Decompressed {
                data,
                metadata: Some(self.metadata),
            })),
            Err(e) => envelope_failure(e),
        }
    }
}

/// An uncompressed replay stream
#[derive(Debug, Clone)]
pub struct Decompressed {
    data: Vec<u8>,
    metadata: Option<ReplayMetadata>,
}

impl Decompressed {
    /// Start from a bare replay stream, as written by the game
    pub fn new(data: Vec<u8>) -> Self {
        Decompressed {
            data,
            metadata: None,
        }
    }

    pub fn metadata(&self) -> Option<&ReplayMetadata> {
        self.metadata.as_ref()
    }

    /// Decode the header
    pub fn process(self, _batch_size: usize) -> Result<ReplayLoadingStage, Error> {
        let mut reader = ReplayReader::new(&self.data);
        let header = read_header(&mut reader)?;
        let position = reader.position();
        Ok(ReplayLoadingStage::WithScenario(WithScenario {
            data: self.data,
            position,
            metadata: self.metadata,
            header,
        }))
    }
}

/// A replay stream whose header has been decoded
#[derive(Debug, Clone)]
pub struct WithScenario {
    data: Vec<u8>,
    position: usize,
    metadata: Option<ReplayMetadata>,
    header: ReplayHeader,
}

impl WithScenario {
    pub fn metadata(&self) -> Option<&ReplayMetadata> {
        self.metadata.as_ref()
    }

    pub fn header(&self) -> &ReplayHeader {
        &self.header
    }

    /// Decode the first batch of input records
    pub fn process(self, batch_size: usize) -> Result<ReplayLoadingStage, Error> {
        let mut reader = ReplayReader::with_position(&self.data, self.position);
        let invariant = read_inputs(&mut reader, None, Some(batch_size.max(1)))?;
        let position = reader.position();
        Ok(ReplayLoadingStage::AtInput(AtInput {
            data: self.data,
            position,
            metadata: self.metadata,
            header: self.header,
            invariant,
        }))
    }
}

/// A replay stream partway through its input records
#[derive(Debug, Clone)]
pub struct AtInput {
    data: Vec<u8>,
    position: usize,
    metadata: Option<ReplayMetadata>,
    header: ReplayHeader,
    invariant: ReplayBodyInvariant,
}

impl AtInput {
    pub fn metadata(&self) -> Option<&ReplayMetadata> {
        self.metadata.as_ref()
    }

    pub fn header(&self) -> &ReplayHeader {
        &self.header
    }

    pub fn invariant(&self) -> &ReplayBodyInvariant {
        &self.invariant
    }

    /// Share of the input records, from 0 to 100, decoded so far
    pub fn percent_complete(&self) -> u8 {
        self.invariant.percent_complete()
    }

    /// Decode the next batch of input records. The batch that exhausts the
    /// stream completes the replay.
    pub fn process(self, batch_size: usize) -> Result<ReplayLoadingStage, Error> {
        if self.invariant.end_of_stream() {
            return Ok(ReplayLoadingStage::Complete(Complete {
                metadata: self.metadata,
                header: self.header,
                body: self.invariant.into_body(),
            }));
        }

        let mut reader = ReplayReader::with_position(&self.data, self.position);
        let invariant = read_inputs(&mut reader, Some(self.invariant), Some(batch_size.max(1)))?;
        if invariant.end_of_stream() {
            return Ok(ReplayLoadingStage::Complete(Complete {
                metadata: self.metadata,
                header: self.header,
                body: invariant.into_body(),
            }));
        }

        let position = reader.position();
        Ok(ReplayLoadingStage::AtInput(AtInput {
            data: self.data,
            position,
            metadata: self.metadata,
            header: self.header,
            invariant,
        }))
    }
}

/// A fully decoded replay
#[derive(Debug, Clone)]
pub struct Complete {
    metadata: Option<ReplayMetadata>,
    header: ReplayHeader,
    body: ReplayBody,
}

impl Complete {
    /// FAForever metadata, absent for SCFA replays
    pub fn metadata(&self) -> Option<&ReplayMetadata> {
        self.metadata.as_ref()
    }

    pub fn header(&self) -> &ReplayHeader {
        &self.header
    }

    pub fn body(&self) -> &ReplayBody {
        &self.body
    }

    pub fn process(self, _batch_size: usize) -> Result<ReplayLoadingStage, Error> {
        Ok(ReplayLoadingStage::Complete(self))
    }

    pub fn into_replay(self) -> Replay {
        Replay {
            header: self.header,
            body: self.body,
        }
    }
}

/// A step of the replay decoding pipeline
#[derive(Debug)]
pub enum ReplayLoadingStage {
    NotStarted(NotStarted),
    WithMetadata(WithMetadata),
    Decompressed(Decompressed),
    WithScenario(WithScenario),
    AtInput(AtInput),
    Complete(Complete),

    /// The FAForever envelope could not be read
    Failed(Error),
}

impl ReplayLoadingStage {
    /// Begin decoding a FAForever replay
    pub fn new(data: Vec<u8>) -> Self {
        ReplayLoadingStage::NotStarted(NotStarted::new(data))
    }

    /// Begin decoding a replay written by the game
    pub fn scfa(data: Vec<u8>) -> Self {
        ReplayLoadingStage::Decompressed(Decompressed::new(data))
    }

    /// Name of the stage, for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            ReplayLoadingStage::NotStarted(_) => "not started",
            ReplayLoadingStage::WithMetadata(_) => "with metadata",
            ReplayLoadingStage::Decompressed(_) => "decompressed",
            ReplayLoadingStage::WithScenario(_) => "with scenario",
            ReplayLoadingStage::AtInput(_) => "at input",
            ReplayLoadingStage::Complete(_) => "complete",
            ReplayLoadingStage::Failed(_) => "failed",
        }
    }

    /// True once processing no longer changes the stage
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReplayLoadingStage::Complete(_) | ReplayLoadingStage::Failed(_)
        )
    }

    /// Progress through the input records, if they are being decoded
    pub fn percent_complete(&self) -> Option<u8> {
        match self {
            ReplayLoadingStage::AtInput(x) => Some(x.percent_complete()),
            ReplayLoadingStage::Complete(_) => Some(100),
            _ => None,
        }
    }

    /// Advance the pipeline by one stage, decoding at most `batch_size` input
    /// records. A batch size of zero is treated as one.
    pub fn process(self, batch_size: usize) -> Result<ReplayLoadingStage, Error> {
        let from = self.name();
        let next = match self {
            ReplayLoadingStage::NotStarted(x) => x.process(batch_size),
            ReplayLoadingStage::WithMetadata(x) => x.process(batch_size),
            ReplayLoadingStage::Decompressed(x) => x.process(batch_size),
            ReplayLoadingStage::WithScenario(x) => x.process(batch_size),
            ReplayLoadingStage::AtInput(x) => x.process(batch_size),
            ReplayLoadingStage::Complete(x) => x.process(batch_size),
            failed @ ReplayLoadingStage::Failed(_) => Ok(failed),
        }?;

        if from != next.name() {
            match &next {
                ReplayLoadingStage::Failed(e) => log::debug!("replay {} -> failed: {}", from, e),
                _ => log::debug!("replay {} -> {}", from, next.name()),
            }
        }

        Ok(next)
    }
}

/// Advance a decoding pipeline by one stage.
///
/// ```rust
/// use fafreplay::{process_replay_stage, ReplayLoadingStage};
/// let mut stage = ReplayLoadingStage::new(b"no metadata here".to_vec());
/// stage = process_replay_stage(stage, 1000)?;
/// assert!(matches!(stage, ReplayLoadingStage::Failed(_)));
/// # Ok::<(), fafreplay::Error>(())
/// ```
pub fn process_replay_stage(
    stage: ReplayLoadingStage,
    batch_size: usize,
) -> Result<ReplayLoadingStage, Error> {
    stage.process(batch_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test_utils::{faf_replay, ReplayWriter},
        ErrorKind,
    };
    use rstest::*;

    /// Process until a terminal stage, checking progress never goes backwards
    fn drive(mut stage: ReplayLoadingStage, batch_size: usize) -> ReplayLoadingStage {
        let mut last_percent = 0;
        let mut steps = 0;
        while !stage.is_terminal() {
            stage = stage.process(batch_size).unwrap();
            if let Some(percent) = stage.percent_complete() {
                assert!(percent >= last_percent);
                last_percent = percent;
            }

            steps += 1;
            assert!(steps < 10_000, "pipeline is not making progress");
        }
        stage
    }

    fn complete(stage: ReplayLoadingStage) -> Complete {
        match stage {
            ReplayLoadingStage::Complete(x) => x,
            x => panic!("expected a complete replay, found {}", x.name()),
        }
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(5)]
    #[case(1000)]
    fn test_scfa_batch_sizes(#[case] batch_size: usize) {
        let data = ReplayWriter::sample_replay();
        let expected = complete(drive(ReplayLoadingStage::scfa(data.clone()), 1000));
        let actual = complete(drive(ReplayLoadingStage::scfa(data), batch_size));

        assert!(actual.metadata().is_none());
        assert_eq!(actual.body().user_input.len(), 22);
        assert_eq!(actual.body(), expected.body());
        assert_eq!(actual.header(), expected.header());
    }

    #[test]
    fn test_stage_order() {
        let data = faf_replay(&ReplayWriter::sample_replay(), Some("zstd"));
        let mut stage = ReplayLoadingStage::new(data);
        let mut names = vec![stage.name()];
        while !stage.is_terminal() {
            stage = process_replay_stage(stage, 10).unwrap();
            names.push(stage.name());
        }

        assert_eq!(
            names,
            vec![
                "not started",
                "with metadata",
                "decompressed",
                "with scenario",
                "at input",
                "at input",
                "complete",
            ]
        );

        let complete = complete(stage);
        let metadata = complete.metadata().unwrap();
        assert_eq!(metadata.uid, Some(1));
        assert_eq!(complete.into_replay().body.user_input.len(), 22);
    }

    #[rstest]
    #[case(None)]
    #[case(Some("gzip"))]
    #[case(Some("zstd"))]
    fn test_faf_compressions(#[case] compression: Option<&str>) {
        let stream = ReplayWriter::sample_replay();
        let expected = complete(drive(ReplayLoadingStage::scfa(stream.clone()), 1000));

        let data = faf_replay(&stream, compression);
        let actual = complete(drive(ReplayLoadingStage::new(data), 7));
        assert_eq!(actual.into_replay(), expected.into_replay());
    }

    #[test]
    fn test_missing_newline_fails() {
        let stage = ReplayLoadingStage::new(b"{\"uid\": 1}".to_vec());
        let stage = drive(stage, 1000);
        let ReplayLoadingStage::Failed(err) = stage else {
            panic!("expected failure");
        };
        assert!(matches!(err.kind(), ErrorKind::MetadataMissing));
    }

    #[test]
    fn test_unknown_compression_fails() {
        let data = faf_replay(&ReplayWriter::sample_replay(), Some("lz4"));
        let stage = drive(ReplayLoadingStage::new(data), 1000);
        let ReplayLoadingStage::Failed(err) = stage else {
            panic!("expected failure");
        };
        assert!(matches!(err.kind(), ErrorKind::UnknownCompression(_)));
    }

    #[test]
    fn test_terminal_stages_are_stable() {
        let stage = drive(ReplayLoadingStage::new(b"{}".to_vec()), 1000);
        let stage = stage.process(1000).unwrap();
        assert!(matches!(stage, ReplayLoadingStage::Failed(_)));

        let stage = drive(ReplayLoadingStage::scfa(ReplayWriter::sample_replay()), 1000);
        let stage = stage.process(1000).unwrap();
        assert_eq!(stage.percent_complete(), Some(100));
    }

    #[test]
    fn test_corrupt_stream_is_an_error() {
        let mut data = ReplayWriter::sample_replay();
        data.truncate(data.len() - 2);
        let mut stage = ReplayLoadingStage::scfa(data);
        let err = loop {
            match stage.process(1000) {
                Ok(next) => stage = next,
                Err(e) => break e,
            }
        };
        assert!(matches!(err.kind(), ErrorKind::Eof { .. }));
    }

    #[test]
    fn test_final_batch_completes() {
        let stage = ReplayLoadingStage::scfa(ReplayWriter::sample_replay());
        let stage = stage.process(20).unwrap().process(20).unwrap();
        assert_eq!(stage.name(), "at input");
        assert!(stage.percent_complete().is_some_and(|x| x < 100));

        let stage = stage.process(20).unwrap();
        assert_eq!(stage.name(), "complete");
        assert_eq!(complete(stage).body().user_input.len(), 22);
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(1000)]
    fn test_desync_batch_sizes(#[case] batch_size: usize) {
        let mut writer = ReplayWriter::new();
        writer.sample_header().desync_body();
        let data = writer.into_inner();

        let expected = crate::load_scfa_replay_from_slice(&data).unwrap();
        assert!(!expected.body.in_sync);

        let actual = complete(drive(ReplayLoadingStage::scfa(data), batch_size));
        assert!(!actual.body().in_sync);
        assert_eq!(actual.into_replay(), expected);
    }

    #[test]
    fn test_empty_body() {
        let mut writer = ReplayWriter::new();
        writer.sample_header();
        let stage = ReplayLoadingStage::scfa(writer.into_inner());
        let stage = stage.process(1000).unwrap().process(1000).unwrap();
        assert_eq!(stage.percent_complete(), Some(100));

        let complete = complete(stage.process(1000).unwrap());
        assert!(complete.body().user_input.is_empty());
        assert!(complete.body().in_sync);
    }
}
