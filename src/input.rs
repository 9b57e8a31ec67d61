use crate::{
    command::{read_command_data, read_command_target, read_command_units},
    read_lua_data, CommandData, CommandTarget, CommandType, CommandUnits, Error, ErrorKind,
    LuaData, ReplayReader,
};
use serde::Serialize;

/// The type tag that starts every input record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReplayInputType {
    Advance,
    SetCommandSource,
    CommandSourceTerminated,
    VerifyChecksum,
    RequestPause,
    RequestResume,
    SingleStep,
    CreateUnit,
    CreateProp,
    DestroyEntity,
    WarpEntity,
    ProcessInfoPair,
    IssueCommand,
    IssueFactoryCommand,
    IncreaseCommandCount,
    DecreaseCommandCount,
    UpdateCommandTarget,
    UpdateCommandType,
    UpdateCommandParameters,
    RemoveFromCommandQueue,
    DebugCommand,
    ExecuteLuaInSim,
    SimCallback,
    EndGame,
}

impl ReplayInputType {
    /// Creates an input type from the tag, returning `None` for tags the
    /// engine doesn't write
    pub fn new(tag: u8) -> Option<ReplayInputType> {
        let kind = match tag {
            0 => ReplayInputType::Advance,
            1 => ReplayInputType::SetCommandSource,
            2 => ReplayInputType::CommandSourceTerminated,
            3 => ReplayInputType::VerifyChecksum,
            4 => ReplayInputType::RequestPause,
            5 => ReplayInputType::RequestResume,
            6 => ReplayInputType::SingleStep,
            7 => ReplayInputType::CreateUnit,
            8 => ReplayInputType::CreateProp,
            9 => ReplayInputType::DestroyEntity,
            10 => ReplayInputType::WarpEntity,
            11 => ReplayInputType::ProcessInfoPair,
            12 => ReplayInputType::IssueCommand,
            13 => ReplayInputType::IssueFactoryCommand,
            14 => ReplayInputType::IncreaseCommandCount,
            15 => ReplayInputType::DecreaseCommandCount,
            16 => ReplayInputType::UpdateCommandTarget,
            17 => ReplayInputType::UpdateCommandType,
            18 => ReplayInputType::UpdateCommandParameters,
            19 => ReplayInputType::RemoveFromCommandQueue,
            20 => ReplayInputType::DebugCommand,
            21 => ReplayInputType::ExecuteLuaInSim,
            22 => ReplayInputType::SimCallback,
            23 => ReplayInputType::EndGame,
            _ => return None,
        };
        Some(kind)
    }

    /// Returns the tag of this input type
    pub fn value(&self) -> u8 {
        *self as u8
    }
}

/// A decoded input record together with the tick and command source that
/// were current when it was recorded
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayInput {
    pub tick: i32,
    pub source: u8,
    pub kind: ReplayInputKind,
}

/// The payload of an input record.
///
/// Records that only advance the decoder state (`Advance`,
/// `SetCommandSource` and `VerifyChecksum`) are never emitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ReplayInputKind {
    CommandSourceTerminated,
    RequestPause,
    RequestResume,
    SingleStep,
    CreateUnit {
        army_id: u8,
        blueprint_id: String,
        x: f32,
        z: f32,
        heading: f32,
    },
    CreateProp {
        blueprint_id: String,
        x: f32,
        z: f32,
        heading: f32,
    },
    DestroyEntity {
        entity_id: i32,
    },
    WarpEntity {
        entity_id: i32,
        x: f32,
        y: f32,
        z: f32,
    },
    ProcessInfoPair {
        entity_id: i32,
        name: String,
        value: String,
    },
    IssueCommand {
        units: CommandUnits,
        data: CommandData,
    },
    IssueFactoryCommand {
        factories: CommandUnits,
        data: CommandData,
    },
    IncreaseCommandCount {
        command_id: i32,
        delta: i32,
    },
    DecreaseCommandCount {
        command_id: i32,
        delta: i32,
    },
    UpdateCommandTarget {
        command_id: i32,
        target: CommandTarget,
    },
    UpdateCommandType {
        command_id: i32,
        command_type: CommandType,
    },
    UpdateCommandParameters {
        command_id: i32,
        lua_parameters: LuaData,
        x: f32,
        y: f32,
        z: f32,
    },
    RemoveFromCommandQueue {
        command_id: i32,
        entity_id: i32,
    },
    DebugCommand {
        command: String,
        x: f32,
        y: f32,
        z: f32,
        focus_army: u8,
        units: CommandUnits,
    },
    ExecuteLuaInSim {
        lua_code: String,
    },
    SimCallback {
        endpoint: String,
        lua_parameters: LuaData,
        units: CommandUnits,
    },
    EndGame,
}

impl ReplayInputKind {
    /// The record type this payload was decoded from
    pub fn input_type(&self) -> ReplayInputType {
        match self {
            ReplayInputKind::CommandSourceTerminated => ReplayInputType::CommandSourceTerminated,
            ReplayInputKind::RequestPause => ReplayInputType::RequestPause,
            ReplayInputKind::RequestResume => ReplayInputType::RequestResume,
            ReplayInputKind::SingleStep => ReplayInputType::SingleStep,
            ReplayInputKind::CreateUnit { .. } => ReplayInputType::CreateUnit,
            ReplayInputKind::CreateProp { .. } => ReplayInputType::CreateProp,
            ReplayInputKind::DestroyEntity { .. } => ReplayInputType::DestroyEntity,
            ReplayInputKind::WarpEntity { .. } => ReplayInputType::WarpEntity,
            ReplayInputKind::ProcessInfoPair { .. } => ReplayInputType::ProcessInfoPair,
            ReplayInputKind::IssueCommand { .. } => ReplayInputType::IssueCommand,
            ReplayInputKind::IssueFactoryCommand { .. } => ReplayInputType::IssueFactoryCommand,
            ReplayInputKind::IncreaseCommandCount { .. } => ReplayInputType::IncreaseCommandCount,
            ReplayInputKind::DecreaseCommandCount { .. } => ReplayInputType::DecreaseCommandCount,
            ReplayInputKind::UpdateCommandTarget { .. } => ReplayInputType::UpdateCommandTarget,
            ReplayInputKind::UpdateCommandType { .. } => ReplayInputType::UpdateCommandType,
            ReplayInputKind::UpdateCommandParameters { .. } => {
                ReplayInputType::UpdateCommandParameters
            }
            ReplayInputKind::RemoveFromCommandQueue { .. } => {
                ReplayInputType::RemoveFromCommandQueue
            }
            ReplayInputKind::DebugCommand { .. } => ReplayInputType::DebugCommand,
            ReplayInputKind::ExecuteLuaInSim { .. } => ReplayInputType::ExecuteLuaInSim,
            ReplayInputKind::SimCallback { .. } => ReplayInputType::SimCallback,
            ReplayInputKind::EndGame => ReplayInputType::EndGame,
        }
    }
}

/// The decoded user input of a replay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayBody {
    pub user_input: Vec<ReplayInput>,

    /// False if any checksum comparison failed
    pub in_sync: bool,
}

/// Decoder state carried from one batch of input records to the next
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayBodyInvariant {
    inputs: Vec<ReplayInput>,
    tick: i32,
    source: u8,
    in_sync: bool,
    last_hash_tick: i32,
    last_hash_value: i64,
    end_of_stream: bool,
    stream_start: usize,
    percent_complete: u8,
}

impl ReplayBodyInvariant {
    /// State for a body that starts at the given offset of the stream
    pub fn new(stream_start: usize) -> Self {
        ReplayBodyInvariant {
            inputs: Vec::new(),
            tick: 0,
            source: 0,
            in_sync: true,
            last_hash_tick: 0,
            last_hash_value: 0,
            end_of_stream: false,
            stream_start,
            percent_complete: 0,
        }
    }

    /// Inputs decoded so far
    pub fn inputs(&self) -> &[ReplayInput] {
        &self.inputs
    }

    pub fn tick(&self) -> i32 {
        self.tick
    }

    pub fn source(&self) -> u8 {
        self.source
    }

    pub fn in_sync(&self) -> bool {
        self.in_sync
    }

    pub fn end_of_stream(&self) -> bool {
        self.end_of_stream
    }

    /// Offset of the first input record
    pub fn stream_start(&self) -> usize {
        self.stream_start
    }

    /// Share of the body, from 0 to 100, that has been decoded
    pub fn percent_complete(&self) -> u8 {
        self.percent_complete
    }

    /// Finish decoding and hand out the body
    pub fn into_body(self) -> ReplayBody {
        ReplayBody {
            user_input: self.inputs,
            in_sync: self.in_sync,
        }
    }

    fn verify_checksum(&mut self, hash: i64, at_tick: i32) {
        // The recorded tick is never advanced, so only checksums recorded at
        // the initial tick are compared against each other.
        if self.last_hash_tick != at_tick {
            self.last_hash_value = hash;
        } else {
            self.in_sync = self.last_hash_value == hash;
            if !self.in_sync {
                log::warn!("checksum mismatch at tick {}", at_tick);
            }
        }
    }
}

fn percent_complete(position: usize, start: usize, len: usize) -> u8 {
    let total = len.saturating_sub(start);
    if total == 0 {
        return 100;
    }

    let done = position.saturating_sub(start);
    let percent = (100.0 * done as f64 / total as f64).round_ties_even();
    percent.clamp(0.0, 100.0) as u8
}

/// Decode input records until the end of the stream or, if given, until
/// `budget` records have been read.
///
/// The returned state is what should be passed back in to continue decoding.
/// When no state is given, decoding starts fresh at the reader's position.
pub fn read_inputs(
    reader: &mut ReplayReader,
    invariant: Option<ReplayBodyInvariant>,
    budget: Option<usize>,
) -> Result<ReplayBodyInvariant, Error> {
    let mut state = match invariant {
        Some(state) => state,
        None => {
            let mut state = ReplayBodyInvariant::new(reader.position());

            // roughly matches the number of inputs of multiplayer replays
            let estimate = (20.0 * (reader.remaining() as f64).sqrt()) as usize;
            state.inputs.reserve(estimate);
            state
        }
    };

    let mut processed = 0;
    while !reader.is_exhausted() {
        if budget.is_some_and(|budget| processed >= budget) {
            break;
        }

        read_input(reader, &mut state)?;
        processed += 1;
    }

    state.end_of_stream = reader.is_exhausted();
    state.percent_complete = percent_complete(reader.position(), state.stream_start, reader.len());
    log::trace!(
        "decoded {} input records, {}% complete",
        processed,
        state.percent_complete
    );
    Ok(state)
}

fn read_input(reader: &mut ReplayReader, state: &mut ReplayBodyInvariant) -> Result<(), Error> {
    let offset = reader.position();
    let tag = reader.read_u8()?;

    // the declared length includes the tag and the length itself
    let declared_len = reader.read_i16()?;

    let input_type = ReplayInputType::new(tag).ok_or_else(|| {
        Error::new(ErrorKind::UnknownInputType {
            input_type: tag,
            offset,
        })
    })?;

    let kind = match input_type {
        ReplayInputType::Advance => {
            let ticks = reader.read_i32()?;
            state.tick = state.tick.wrapping_add(ticks);
            None
        }
        ReplayInputType::SetCommandSource => {
            state.source = reader.read_u8()?;
            None
        }
        ReplayInputType::CommandSourceTerminated => Some(ReplayInputKind::CommandSourceTerminated),
        ReplayInputType::VerifyChecksum => {
            let hash = reader.read_i64()? ^ reader.read_i64()?;
            let at_tick = reader.read_i32()?;
            state.verify_checksum(hash, at_tick);
            None
        }
        ReplayInputType::RequestPause => Some(ReplayInputKind::RequestPause),
        ReplayInputType::RequestResume => Some(ReplayInputKind::RequestResume),
        ReplayInputType::SingleStep => Some(ReplayInputKind::SingleStep),
        ReplayInputType::CreateUnit => {
            let army_id = reader.read_u8()?;
            let blueprint_id = reader.read_string()?;
            let x = reader.read_f32()?;
            let z = reader.read_f32()?;
            let heading = reader.read_f32()?;
            Some(ReplayInputKind::CreateUnit {
                army_id,
                blueprint_id,
                x,
                z,
                heading,
            })
        }
        ReplayInputType::CreateProp => {
            let blueprint_id = reader.read_string()?;
            let x = reader.read_f32()?;
            let z = reader.read_f32()?;
            let heading = reader.read_f32()?;
            Some(ReplayInputKind::CreateProp {
                blueprint_id,
                x,
                z,
                heading,
            })
        }
        ReplayInputType::DestroyEntity => Some(ReplayInputKind::DestroyEntity {
            entity_id: reader.read_i32()?,
        }),
        ReplayInputType::WarpEntity => {
            let entity_id = reader.read_i32()?;
            let x = reader.read_f32()?;
            let y = reader.read_f32()?;
            let z = reader.read_f32()?;
            Some(ReplayInputKind::WarpEntity { entity_id, x, y, z })
        }
        ReplayInputType::ProcessInfoPair => {
            let entity_id = reader.read_i32()?;
            let name = reader.read_string()?;
            let value = reader.read_string()?;
            Some(ReplayInputKind::ProcessInfoPair {
                entity_id,
                name,
                value,
            })
        }
        ReplayInputType::IssueCommand => {
            let units = read_command_units(reader)?;
            let data = read_command_data(reader)?;
            Some(ReplayInputKind::IssueCommand { units, data })
        }
        ReplayInputType::IssueFactoryCommand => {
            let factories = read_command_units(reader)?;
            let data = read_command_data(reader)?;
            Some(ReplayInputKind::IssueFactoryCommand { factories, data })
        }
        ReplayInputType::IncreaseCommandCount => {
            let command_id = reader.read_i32()?;
            let delta = reader.read_i32()?;
            Some(ReplayInputKind::IncreaseCommandCount { command_id, delta })
        }
        ReplayInputType::DecreaseCommandCount => {
            let command_id = reader.read_i32()?;
            let delta = reader.read_i32()?;
            Some(ReplayInputKind::DecreaseCommandCount { command_id, delta })
        }
        ReplayInputType::UpdateCommandTarget => {
            let command_id = reader.read_i32()?;
            let target = read_command_target(reader)?;
            Some(ReplayInputKind::UpdateCommandTarget { command_id, target })
        }
        ReplayInputType::UpdateCommandType => {
            let command_id = reader.read_i32()?;
            let command_type = CommandType::new(reader.read_i32()?);
            Some(ReplayInputKind::UpdateCommandType {
                command_id,
                command_type,
            })
        }
        ReplayInputType::UpdateCommandParameters => {
            let command_id = reader.read_i32()?;
            let lua_parameters = read_lua_data(reader)?;
            let x = reader.read_f32()?;
            let y = reader.read_f32()?;
            let z = reader.read_f32()?;
            Some(ReplayInputKind::UpdateCommandParameters {
                command_id,
                lua_parameters,
                x,
                y,
                z,
            })
        }
        ReplayInputType::RemoveFromCommandQueue => {
            let command_id = reader.read_i32()?;
            let entity_id = reader.read_i32()?;
            Some(ReplayInputKind::RemoveFromCommandQueue {
                command_id,
                entity_id,
            })
        }
        ReplayInputType::DebugCommand => {
            let command = reader.read_string()?;
            let x = reader.read_f32()?;
            let y = reader.read_f32()?;
            let z = reader.read_f32()?;
            let focus_army = reader.read_u8()?;
            let units = read_command_units(reader)?;
            Some(ReplayInputKind::DebugCommand {
                command,
                x,
                y,
                z,
                focus_army,
                units,
            })
        }
        ReplayInputType::ExecuteLuaInSim => Some(ReplayInputKind::ExecuteLuaInSim {
            lua_code: reader.read_string()?,
        }),
        ReplayInputType::SimCallback => {
            let endpoint = reader.read_string()?;
            let lua_parameters = read_lua_data(reader)?;
            let units = read_command_units(reader)?;
            Some(ReplayInputKind::SimCallback {
                endpoint,
                lua_parameters,
                units,
            })
        }
        ReplayInputType::EndGame => Some(ReplayInputKind::EndGame),
    };

    let consumed = reader.position() - offset;
    if usize::try_from(declared_len).ok() != Some(consumed) {
        log::debug!(
            "{:?} record at offset {} declared {} bytes but {} were read",
            input_type,
            offset,
            declared_len,
            consumed
        );
    }

    if let Some(kind) = kind {
        state.inputs.push(ReplayInput {
            tick: state.tick,
            source: state.source,
            kind,
        });
    }

    Ok(())
}
