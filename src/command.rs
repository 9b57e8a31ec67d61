use crate::{read_lua_data, Error, ErrorKind, LuaData, ReplayReader};
use serde::Serialize;

const TARGET_ENTITY: u8 = 0;
const TARGET_POSITION: u8 = 1;

const NO_FORMATION: i32 = -1;

/// The order given to units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CommandType {
    None,
    Stop,
    Move,
    Dive,
    FormMove,
    BuildSiloTactical,
    BuildSiloNuke,
    BuildFactory,
    BuildMobile,
    BuildAssist,
    Attack,
    FormAttack,
    Nuke,
    Tactical,
    Teleport,
    Guard,
    Patrol,
    Ferry,
    FormPatrol,
    Reclaim,
    Repair,
    Capture,
    TransportLoadUnits,
    TransportReverseLoadUnits,
    TransportUnloadUnits,
    TransportUnloadSpecificUnits,
    DetachFromTransport,
    Upgrade,
    Script,
    AssistCommander,
    KillSelf,
    DestroySelf,
    Sacrifice,
    Pause,
    OverCharge,
    AggressiveMove,
    FormAggressiveMove,
    AssistMove,
    SpecialAction,
    Dock,

    /// A value outside of the known command types
    Other(i32),
}

const COMMAND_TYPES: [CommandType; 40] = [
    CommandType::None,
    CommandType::Stop,
    CommandType::Move,
    CommandType::Dive,
    CommandType::FormMove,
    CommandType::BuildSiloTactical,
    CommandType::BuildSiloNuke,
    CommandType::BuildFactory,
    CommandType::BuildMobile,
    CommandType::BuildAssist,
    CommandType::Attack,
    CommandType::FormAttack,
    CommandType::Nuke,
    CommandType::Tactical,
    CommandType::Teleport,
    CommandType::Guard,
    CommandType::Patrol,
    CommandType::Ferry,
    CommandType::FormPatrol,
    CommandType::Reclaim,
    CommandType::Repair,
    CommandType::Capture,
    CommandType::TransportLoadUnits,
    CommandType::TransportReverseLoadUnits,
    CommandType::TransportUnloadUnits,
    CommandType::TransportUnloadSpecificUnits,
    CommandType::DetachFromTransport,
    CommandType::Upgrade,
    CommandType::Script,
    CommandType::AssistCommander,
    CommandType::KillSelf,
    CommandType::DestroySelf,
    CommandType::Sacrifice,
    CommandType::Pause,
    CommandType::OverCharge,
    CommandType::AggressiveMove,
    CommandType::FormAggressiveMove,
    CommandType::AssistMove,
    CommandType::SpecialAction,
    CommandType::Dock,
];

impl CommandType {
    /// Creates a command type from its numeric value
    pub fn new(kind: i32) -> CommandType {
        usize::try_from(kind)
            .ok()
            .and_then(|x| COMMAND_TYPES.get(x))
            .copied()
            .unwrap_or(CommandType::Other(kind))
    }

    /// Returns the numeric value of this command type
    pub fn value(&self) -> i32 {
        match self {
            CommandType::Other(x) => *x,
            known => COMMAND_TYPES
                .iter()
                .position(|x| x == known)
                .map_or(-1, |x| x as i32),
        }
    }
}

/// What a command is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum CommandTarget {
    None,
    Entity(i32),
    Position { x: f32, y: f32, z: f32 },
}

/// Group movement shape attached to a command
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum CommandFormation {
    NoFormation,
    Formation {
        id: i32,
        heading: f32,
        x: f32,
        y: f32,
        z: f32,
        scale: f32,
    },
}

/// The units (or factories) a command is issued to.
///
/// Only the number of entities is kept. An entity id can't be tied back to a
/// unit without simulating the game, so the ids themselves are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommandUnits {
    pub count: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandData {
    pub command_id: i32,
    pub command_type: CommandType,
    pub target: CommandTarget,
    pub formation: CommandFormation,
    pub blueprint_id: String,
    pub lua_data: LuaData,
    pub add_to_queue: bool,

    // unknown, read to stay in position
    pub arg1: i32,
    pub arg2: i32,
    pub arg3: u8,
    pub arg4: i32,
    pub arg5: i32,
    pub arg6: i32,
}

/// Decode a command target: a one byte tag followed by an entity id or a
/// position. Unrecognized tags mean there is no target and nothing else to
/// read.
///
/// ```rust
/// use fafreplay::{read_command_target, CommandTarget, ReplayReader};
/// let data = [0x00, 0x2a, 0x00, 0x00, 0x00];
/// let mut reader = ReplayReader::new(&data[..]);
/// assert_eq!(read_command_target(&mut reader)?, CommandTarget::Entity(42));
/// assert_eq!(reader.position(), 5);
/// # Ok::<(), fafreplay::Error>(())
/// ```
pub fn read_command_target(reader: &mut ReplayReader) -> Result<CommandTarget, Error> {
    match reader.read_u8()? {
        TARGET_ENTITY => reader.read_i32().map(CommandTarget::Entity),
        TARGET_POSITION => {
            let x = reader.read_f32()?;
            let y = reader.read_f32()?;
            let z = reader.read_f32()?;
            Ok(CommandTarget::Position { x, y, z })
        }
        _ => Ok(CommandTarget::None),
    }
}

pub fn read_command_formation(reader: &mut ReplayReader) -> Result<CommandFormation, Error> {
    let id = reader.read_i32()?;
    if id == NO_FORMATION {
        return Ok(CommandFormation::NoFormation);
    }

    let heading = reader.read_f32()?;
    let x = reader.read_f32()?;
    let y = reader.read_f32()?;
    let z = reader.read_f32()?;
    let scale = reader.read_f32()?;
    Ok(CommandFormation::Formation {
        id,
        heading,
        x,
        y,
        z,
        scale,
    })
}

pub fn read_command_units(reader: &mut ReplayReader) -> Result<CommandUnits, Error> {
    let offset = reader.position();
    let count = reader.read_i32()?;
    let ids = usize::try_from(count)
        .map_err(|_| Error::new(ErrorKind::InvalidUnitCount { count, offset }))?;
    let bytes = ids
        .checked_mul(4)
        .ok_or_else(|| Error::new(ErrorKind::Eof { offset }))?;
    reader.skip(bytes)?;
    Ok(CommandUnits { count })
}

pub fn read_command_data(reader: &mut ReplayReader) -> Result<CommandData, Error> {
    let command_id = reader.read_i32()?;
    let arg1 = reader.read_i32()?;
    let command_type = CommandType::new(i32::from(reader.read_u8()?));
    let arg2 = reader.read_i32()?;
    let target = read_command_target(reader)?;
    let arg3 = reader.read_u8()?;
    let formation = read_command_formation(reader)?;
    let blueprint_id = reader.read_string()?;
    let arg4 = reader.read_i32()?;
    let arg5 = reader.read_i32()?;
    let arg6 = reader.read_i32()?;
    let lua_data = read_lua_data(reader)?;
    let add_to_queue = reader.read_u8()? > 0;

    Ok(CommandData {
        command_id,
        command_type,
        target,
        formation,
        blueprint_id,
        lua_data,
        add_to_queue,
        arg1,
        arg2,
        arg3,
        arg4,
        arg5,
        arg6,
    })
}
