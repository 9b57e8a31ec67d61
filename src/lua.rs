//! Lua values embedded in replays
//!
//! The engine serializes script values with a one byte type tag followed by
//! the payload:
//!
//! | tag | value  | payload                                        |
//! |-----|--------|------------------------------------------------|
//! | 0   | number | f32                                            |
//! | 1   | string | null terminated bytes                          |
//! | 2   | nil    | one padding byte                               |
//! | 3   | bool   | u8, non-zero is true                           |
//! | 4   | table  | key / value pairs until a table end tag        |
//! | 5   | end    | closes the innermost table                     |

use crate::{Error, ErrorKind, ReplayReader};
use serde::Serialize;

const LUA_NUMBER: u8 = 0;
const LUA_STRING: u8 = 1;
const LUA_NIL: u8 = 2;
const LUA_BOOL: u8 = 3;
const LUA_TABLE_START: u8 = 4;
const LUA_TABLE_END: u8 = 5;

const MAX_DEPTH: usize = 64;

/// A decoded lua value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LuaData {
    Nil,
    Bool(bool),
    Number(f32),
    String(String),
    Table(LuaTable),
}

impl LuaData {
    pub fn as_table(&self) -> Option<&LuaTable> {
        match self {
            LuaData::Table(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            LuaData::String(x) => Some(x.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f32> {
        match self {
            LuaData::Number(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            LuaData::Bool(x) => Some(*x),
            _ => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, LuaData::Nil)
    }
}

/// A lua table with entries kept in the order they were encoded.
///
/// Keys are normalized to text. Numeric keys are written without a fractional
/// part when they are whole numbers, so the first array element of a table is
/// found under `"1"`.
///
/// ```rust
/// use fafreplay::{LuaData, LuaTable};
/// let table = LuaTable::from_iter([
///     (String::from("1"), LuaData::Number(512.0)),
///     (String::from("name"), LuaData::String(String::from("Seton's Clutch"))),
/// ]);
/// assert_eq!(table.get_number("1"), Some(512.0));
/// assert_eq!(table.get_str("name"), Some("Seton's Clutch"));
/// assert_eq!(table.get_table("name"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LuaTable {
    entries: Vec<(String, LuaData)>,
}

impl LuaTable {
    pub fn new() -> Self {
        LuaTable::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, key: String, value: LuaData) {
        self.entries.push((key, value))
    }

    /// Return the value of the first entry with the given key
    pub fn get(&self, key: &str) -> Option<&LuaData> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(LuaData::as_str)
    }

    pub fn get_number(&self, key: &str) -> Option<f32> {
        self.get(key).and_then(LuaData::as_number)
    }

    pub fn get_table(&self, key: &str) -> Option<&LuaTable> {
        self.get(key).and_then(LuaData::as_table)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(LuaData::as_bool)
    }

    /// Iterate over the entries in encoded order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LuaData)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over the values in encoded order
    pub fn values(&self) -> impl Iterator<Item = &LuaData> + '_ {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl FromIterator<(String, LuaData)> for LuaTable {
    fn from_iter<T: IntoIterator<Item = (String, LuaData)>>(iter: T) -> Self {
        LuaTable {
            entries: iter.into_iter().collect(),
        }
    }
}

fn number_key(x: f32) -> String {
    if x.fract() == 0.0 && x.abs() < 1e9 {
        format!("{}", x as i64)
    } else {
        format!("{}", x)
    }
}

/// Decode the next lua value. Values are self delimiting, so no length is
/// required.
///
/// ```rust
/// use fafreplay::{read_lua_data, LuaData, ReplayReader};
/// let data = [4, 1, b'a', 0, 3, 1, 5];
/// let mut reader = ReplayReader::new(&data[..]);
/// let value = read_lua_data(&mut reader)?;
/// assert_eq!(value.as_table().and_then(|t| t.get_bool("a")), Some(true));
/// assert!(reader.is_exhausted());
/// # Ok::<(), fafreplay::Error>(())
/// ```
pub fn read_lua_data(reader: &mut ReplayReader) -> Result<LuaData, Error> {
    read_value(reader, 0)
}

fn read_value(reader: &mut ReplayReader, depth: usize) -> Result<LuaData, Error> {
    let offset = reader.position();
    match reader.read_u8()? {
        LUA_NUMBER => reader.read_f32().map(LuaData::Number),
        LUA_STRING => reader.read_string().map(LuaData::String),
        LUA_NIL => {
            reader.skip(1)?;
            Ok(LuaData::Nil)
        }
        LUA_BOOL => Ok(LuaData::Bool(reader.read_u8()? != 0)),
        LUA_TABLE_START => {
            if depth >= MAX_DEPTH {
                return Err(Error::new(ErrorKind::LuaDepthExceeded { offset }));
            }
            read_table(reader, depth + 1).map(LuaData::Table)
        }
        lua_type => Err(Error::new(ErrorKind::UnknownLuaType { lua_type, offset })),
    }
}

fn read_table(reader: &mut ReplayReader, depth: usize) -> Result<LuaTable, Error> {
    let mut table = LuaTable::new();
    while reader.peek_u8()? != LUA_TABLE_END {
        let offset = reader.position();
        let key = match read_value(reader, depth)? {
            LuaData::String(x) => x,
            LuaData::Number(x) => number_key(x),
            LuaData::Bool(x) => x.to_string(),
            LuaData::Nil | LuaData::Table(_) => {
                return Err(Error::new(ErrorKind::InvalidLuaKey { offset }))
            }
        };

        let value = read_value(reader, depth)?;
        table.push(key, value);
    }

    reader.skip(1)?;
    Ok(table)
}
