use crate::{read_lua_data, Error, ErrorKind, LuaData, LuaTable, ReplayReader};
use serde::Serialize;

/// Marker byte that ends an army entry early
const ARMY_END_SENTINEL: u8 = 255;

/// Everything that precedes the user input of a replay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayHeader {
    pub game_version: String,
    pub replay_version: String,
    pub scenario_path: String,
    pub scenario: ReplayScenario,
    pub clients: Vec<ReplayClient>,

    /// Mod descriptors in the order they were activated
    pub mods: Vec<LuaTable>,
    pub cheats_enabled: bool,

    /// Lobby configuration of each army slot
    pub army_configs: Vec<LuaData>,
    pub seed: i32,

    // Always a CRLF and a CRLF with an unknown byte, kept only so that a
    // header can be inspected byte for byte
    pub(crate) unknown1: String,
    pub(crate) unknown2: String,
}

impl ReplayHeader {
    /// Armies that have a player (human or AI) assigned, identified by their
    /// slot index
    pub fn armies(&self) -> Vec<ReplayArmy> {
        self.army_configs
            .iter()
            .enumerate()
            .filter_map(|(id, config)| {
                let name = config.as_table()?.get_str("PlayerName")?;
                Some(ReplayArmy {
                    name: name.to_string(),
                    id: id as i32,
                })
            })
            .collect()
    }
}

/// A human participant whose input is recorded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayClient {
    pub name: String,
    pub id: i32,
}

/// An army that is participating in the scenario. These armies are defined in
/// the lobby and can be either a human player or an AI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayArmy {
    pub name: String,
    pub id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayScenario {
    pub options: ReplayScenarioOptions,
    pub map: ReplayScenarioMap,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Lobby options of the scenario.
///
/// Mods inject their own options next to the lobby ones so the table can
/// contain anything. No fields are extracted yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayScenarioOptions {}

/// The map as described by its `_scenario.lua` file. Any key may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayScenarioMap {
    pub name: Option<String>,
    pub description: Option<String>,
    pub map_path: Option<String>,
    pub preview: Option<String>,
    pub repository: Option<String>,
    pub version: Option<i32>,
    pub size_x: Option<i32>,
    pub size_z: Option<i32>,
    pub mass_reclaim: Option<i32>,
    pub energy_reclaim: Option<i32>,
}

fn pair(table: Option<&LuaTable>) -> (Option<i32>, Option<i32>) {
    match table {
        Some(t) => (
            t.get_number("1").map(|x| x as i32),
            t.get_number("2").map(|x| x as i32),
        ),
        None => (None, None),
    }
}

impl ReplayScenarioMap {
    fn from_lua(scenario: &LuaTable) -> Self {
        let (size_x, size_z) = pair(scenario.get_table("size"));
        let (mass_reclaim, energy_reclaim) = pair(scenario.get_table("reclaim"));
        let text = |key: &str| scenario.get_str(key).map(String::from);

        ReplayScenarioMap {
            name: text("name"),
            description: text("description"),
            map_path: text("map"),
            preview: text("preview"),
            repository: text("repository"),
            version: scenario.get_number("map_version").map(|x| x as i32),
            size_x,
            size_z,
            mass_reclaim,
            energy_reclaim,
        }
    }
}

impl ReplayScenarioOptions {
    fn from_lua(_scenario: &LuaTable) -> Self {
        ReplayScenarioOptions {}
    }
}

fn read_scenario(reader: &mut ReplayReader) -> Result<ReplayScenario, Error> {
    let offset = reader.position();
    let LuaData::Table(scenario) = read_lua_data(reader)? else {
        return Err(Error::new(ErrorKind::ScenarioNotTable { offset }));
    };

    Ok(ReplayScenario {
        options: ReplayScenarioOptions::from_lua(&scenario),
        map: ReplayScenarioMap::from_lua(&scenario),
        kind: scenario.get_str("type").map(String::from),
    })
}

/// Decode the replay header, leaving the reader at the first input record
pub fn read_header(reader: &mut ReplayReader) -> Result<ReplayHeader, Error> {
    let game_version = reader.read_string()?;
    let unknown1 = reader.read_string()?;

    let offset = reader.position();
    let version_and_scenario = reader.read_string()?;
    let (replay_version, scenario_path) = version_and_scenario
        .split_once("\r\n")
        .ok_or_else(|| Error::new(ErrorKind::MalformedReplayVersion { offset }))?;
    let replay_version = replay_version.to_string();
    let scenario_path = scenario_path
        .split("\r\n")
        .next()
        .unwrap_or_default()
        .to_string();

    let unknown2 = reader.read_string()?;

    // the byte length of the mods is a positional marker, lua values are self
    // delimiting
    let _mods_len = reader.read_i32()?;
    let mods = match read_lua_data(reader)? {
        LuaData::Table(mods) => mods
            .values()
            .filter_map(LuaData::as_table)
            .cloned()
            .collect(),
        _ => Vec::new(),
    };

    let _scenario_len = reader.read_i32()?;
    let scenario = read_scenario(reader)?;

    let client_count = reader.read_u8()?;
    let mut clients = Vec::with_capacity(usize::from(client_count));
    for _ in 0..client_count {
        let name = reader.read_string()?;
        let id = reader.read_i32()?;
        clients.push(ReplayClient { name, id });
    }

    let cheats_enabled = reader.read_u8()? > 0;

    let army_count = reader.read_u8()?;
    let mut army_configs = Vec::with_capacity(usize::from(army_count));
    for _ in 0..army_count {
        let _config_len = reader.read_i32()?;
        army_configs.push(read_lua_data(reader)?);

        if reader.read_u8()? != ARMY_END_SENTINEL {
            reader.skip(1)?;
        }
    }

    let seed = reader.read_i32()?;

    Ok(ReplayHeader {
        game_version,
        replay_version,
        scenario_path,
        scenario,
        clients,
        mods,
        cheats_enabled,
        army_configs,
        seed,
        unknown1,
        unknown2,
    })
}
