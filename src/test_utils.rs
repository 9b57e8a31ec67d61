//! Encoders for building replays in tests

use crate::ReplayInputType;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use flate2::{write::ZlibEncoder, Compression};
use std::io::Write;

pub(crate) const SAMPLE_SCENARIO_PATH: &str = "/maps/setons/setons_scenario.lua";

/// Encode the way the FAForever server did before zstd: base64 of a big
/// endian length followed by a zlib stream
pub(crate) fn gzip_body(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    let zlib = encoder.finish().unwrap();

    let mut framed = (data.len() as u32).to_be_bytes().to_vec();
    framed.extend_from_slice(&zlib);
    STANDARD.encode(framed).into_bytes()
}

pub(crate) fn zstd_body(data: &[u8]) -> Vec<u8> {
    zstd::stream::encode_all(data, 3).unwrap()
}

/// A FAForever replay wrapping `data` with the given metadata compression
/// key (`None` omits the key)
pub(crate) fn faf_replay(data: &[u8], compression: Option<&str>) -> Vec<u8> {
    let (metadata, body) = match compression {
        None => (String::from(r#"{"uid": 1, "title": "test"}"#), gzip_body(data)),
        Some(name) => {
            let metadata = format!(r#"{{"uid": 1, "title": "test", "compression": "{}"}}"#, name);
            let body = if name == "zstd" {
                zstd_body(data)
            } else {
                gzip_body(data)
            };
            (metadata, body)
        }
    };

    let mut out = metadata.into_bytes();
    out.push(b'\n');
    out.extend_from_slice(&body);
    out
}

#[derive(Debug, Default)]
pub(crate) struct LuaWriter {
    buf: Vec<u8>,
}

impl LuaWriter {
    pub fn new() -> Self {
        LuaWriter::default()
    }

    pub fn number(&mut self, x: f32) -> &mut Self {
        self.buf.push(0);
        self.buf.extend_from_slice(&x.to_le_bytes());
        self
    }

    pub fn string(&mut self, x: &str) -> &mut Self {
        self.buf.push(1);
        self.buf.extend_from_slice(x.as_bytes());
        self.buf.push(0);
        self
    }

    pub fn nil(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[2, 0]);
        self
    }

    pub fn bool(&mut self, x: bool) -> &mut Self {
        self.buf.extend_from_slice(&[3, u8::from(x)]);
        self
    }

    pub fn table_start(&mut self) -> &mut Self {
        self.buf.push(4);
        self
    }

    pub fn table_end(&mut self) -> &mut Self {
        self.buf.push(5);
        self
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

#[derive(Debug, Default)]
pub(crate) struct ReplayWriter {
    buf: Vec<u8>,
}

impl ReplayWriter {
    pub fn new() -> Self {
        ReplayWriter::default()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn u8(&mut self, x: u8) -> &mut Self {
        self.buf.push(x);
        self
    }

    pub fn i16(&mut self, x: i16) -> &mut Self {
        self.buf.extend_from_slice(&x.to_le_bytes());
        self
    }

    pub fn i32(&mut self, x: i32) -> &mut Self {
        self.buf.extend_from_slice(&x.to_le_bytes());
        self
    }

    pub fn i64(&mut self, x: i64) -> &mut Self {
        self.buf.extend_from_slice(&x.to_le_bytes());
        self
    }

    pub fn f32(&mut self, x: f32) -> &mut Self {
        self.buf.extend_from_slice(&x.to_le_bytes());
        self
    }

    pub fn cstr(&mut self, x: &str) -> &mut Self {
        self.buf.extend_from_slice(x.as_bytes());
        self.buf.push(0);
        self
    }

    pub fn lua(&mut self, f: impl FnOnce(&mut LuaWriter)) -> &mut Self {
        let mut lua = LuaWriter::new();
        f(&mut lua);
        self.buf.extend_from_slice(&lua.into_inner());
        self
    }

    /// A lua value preceded by its byte length
    pub fn sized_lua(&mut self, f: impl FnOnce(&mut LuaWriter)) -> &mut Self {
        let mut lua = LuaWriter::new();
        f(&mut lua);
        let data = lua.into_inner();
        self.i32(data.len() as i32);
        self.buf.extend_from_slice(&data);
        self
    }

    /// Write an input record, deriving the declared length from the payload
    pub fn record(&mut self, kind: ReplayInputType, f: impl FnOnce(&mut ReplayWriter)) -> &mut Self {
        let mut payload = ReplayWriter::new();
        f(&mut payload);
        let payload = payload.into_inner();
        self.u8(kind.value());
        self.i16(payload.len() as i16 + 3);
        self.buf.extend_from_slice(&payload);
        self
    }

    /// A two player skirmish on a 1024x1024 map with one sim mod and a third,
    /// empty, army slot
    pub fn sample_header(&mut self) -> &mut Self {
        self.cstr("Supreme Commander v1.50.3780")
            .cstr("\r\n")
            .cstr(&format!("Replay v1.9\r\n{}", SAMPLE_SCENARIO_PATH))
            .cstr("\r\n\x1a")
            .sized_lua(|lua| {
                lua.table_start()
                    .number(1.0)
                    .table_start()
                    .string("name")
                    .string("Supreme Economy")
                    .string("uid")
                    .string("89BF1572-9EA8-11DC-1313-635F56D89591")
                    .table_end()
                    .number(2.0)
                    .string("not a mod")
                    .table_end();
            })
            .sized_lua(|lua| {
                lua.table_start()
                    .string("name")
                    .string("Seton's Clutch")
                    .string("description")
                    .string("Dual Gap")
                    .string("map")
                    .string("/maps/setons/setons.scmap")
                    .string("preview")
                    .string("")
                    .string("map_version")
                    .number(3.0)
                    .string("type")
                    .string("skirmish")
                    .string("size")
                    .table_start()
                    .number(1.0)
                    .number(1024.0)
                    .number(2.0)
                    .number(1024.0)
                    .table_end()
                    .string("reclaim")
                    .table_start()
                    .number(1.0)
                    .number(0.0)
                    .number(2.0)
                    .number(0.0)
                    .table_end()
                    .string("norushradius")
                    .number(40.0)
                    .table_end();
            })
            .u8(2)
            .cstr("Alpha")
            .i32(1)
            .cstr("Bravo")
            .i32(2)
            .u8(0)
            .u8(3)
            .sized_lua(|lua| {
                lua.table_start()
                    .string("PlayerName")
                    .string("Alpha")
                    .string("Human")
                    .bool(true)
                    .table_end();
            })
            .u8(0)
            .u8(255)
            .sized_lua(|lua| {
                lua.table_start()
                    .string("PlayerName")
                    .string("Bravo")
                    .string("Human")
                    .bool(true)
                    .table_end();
            })
            .u8(255)
            .sized_lua(|lua| {
                lua.table_start().table_end();
            })
            .u8(1)
            .u8(255)
            .i32(42)
    }

    fn command_data(&mut self, command_id: i32) -> &mut Self {
        self.i32(command_id)
            .i32(-1)
            .u8(2)
            .i32(0)
            .u8(1)
            .f32(100.0)
            .f32(20.0)
            .f32(300.0)
            .u8(0)
            .i32(0)
            .f32(1.5)
            .f32(100.0)
            .f32(20.0)
            .f32(300.0)
            .f32(1.0)
            .cstr("")
            .i32(0)
            .i32(0)
            .i32(0)
            .lua(|lua| {
                lua.nil();
            })
            .u8(0)
    }

    /// One record of every type, ending at tick 30 from source 0. Two of the
    /// sim callbacks are from source 1 and the first one is a chat message.
    pub fn sample_body(&mut self) -> &mut Self {
        self.record(ReplayInputType::SetCommandSource, |w| {
            w.u8(0);
        })
        .record(ReplayInputType::Advance, |w| {
            w.i32(1);
        })
        .record(ReplayInputType::CreateUnit, |w| {
            w.u8(1).cstr("uel0001").f32(10.0).f32(20.0).f32(0.0);
        })
        .record(ReplayInputType::VerifyChecksum, |w| {
            w.i64(0x1234).i64(0x1234).i32(0);
        })
        .record(ReplayInputType::IssueCommand, |w| {
            w.i32(2).i32(100).i32(101).command_data(1);
        })
        .record(ReplayInputType::IssueFactoryCommand, |w| {
            w.i32(1).i32(102).command_data(2);
        })
        .record(ReplayInputType::IncreaseCommandCount, |w| {
            w.i32(2).i32(5);
        })
        .record(ReplayInputType::DecreaseCommandCount, |w| {
            w.i32(2).i32(1);
        })
        .record(ReplayInputType::UpdateCommandTarget, |w| {
            w.i32(1).u8(0).i32(103);
        })
        .record(ReplayInputType::UpdateCommandType, |w| {
            w.i32(1).i32(10);
        })
        .record(ReplayInputType::UpdateCommandParameters, |w| {
            w.i32(1)
                .lua(|lua| {
                    lua.table_start().string("x").number(1.0).table_end();
                })
                .f32(1.0)
                .f32(2.0)
                .f32(3.0);
        })
        .record(ReplayInputType::RemoveFromCommandQueue, |w| {
            w.i32(1).i32(100);
        })
        .record(ReplayInputType::Advance, |w| {
            w.i32(10);
        })
        .record(ReplayInputType::SetCommandSource, |w| {
            w.u8(1);
        })
        .record(ReplayInputType::SimCallback, |w| {
            w.cstr("GiveResourcesToPlayer")
                .lua(|lua| {
                    lua.table_start()
                        .string("From")
                        .number(2.0)
                        .string("To")
                        .number(-1.0)
                        .string("Mass")
                        .number(0.0)
                        .string("Energy")
                        .number(0.0)
                        .string("Sender")
                        .string("Bravo")
                        .string("Msg")
                        .table_start()
                        .string("to")
                        .string("all")
                        .string("text")
                        .string("gl hf")
                        .table_end()
                        .table_end();
                })
                .i32(0);
        })
        .record(ReplayInputType::SimCallback, |w| {
            w.cstr("SpawnPing")
                .lua(|lua| {
                    lua.table_start()
                        .string("Type")
                        .string("alert")
                        .table_end();
                })
                .i32(1)
                .i32(100);
        })
        .record(ReplayInputType::RequestPause, |_| {})
        .record(ReplayInputType::SingleStep, |_| {})
        .record(ReplayInputType::RequestResume, |_| {})
        .record(ReplayInputType::CreateProp, |w| {
            w.cstr("/env/common/props/trees/oak01_prop.bp")
                .f32(5.0)
                .f32(6.0)
                .f32(0.5);
        })
        .record(ReplayInputType::DestroyEntity, |w| {
            w.i32(100);
        })
        .record(ReplayInputType::WarpEntity, |w| {
            w.i32(101).f32(1.0).f32(2.0).f32(3.0);
        })
        .record(ReplayInputType::ProcessInfoPair, |w| {
            w.i32(101).cstr("SetAutoMode").cstr("true");
        })
        .record(ReplayInputType::DebugCommand, |w| {
            w.cstr("dbg navwaypoints")
                .f32(1.0)
                .f32(2.0)
                .f32(3.0)
                .u8(1)
                .i32(0);
        })
        .record(ReplayInputType::ExecuteLuaInSim, |w| {
            w.cstr("LOG('hello')");
        })
        .record(ReplayInputType::VerifyChecksum, |w| {
            w.i64(5).i64(6).i32(20);
        })
        .record(ReplayInputType::Advance, |w| {
            w.i32(19);
        })
        .record(ReplayInputType::SetCommandSource, |w| {
            w.u8(0);
        })
        .record(ReplayInputType::CommandSourceTerminated, |_| {})
        .record(ReplayInputType::EndGame, |_| {})
    }

    /// Checksums recorded at a later tick only replace the stored hash. The
    /// first tick 0 checksum agrees with the last stored hash and the second
    /// one doesn't, leaving the replay out of sync.
    pub fn desync_body(&mut self) -> &mut Self {
        self.record(ReplayInputType::Advance, |w| {
            w.i32(1);
        })
        .record(ReplayInputType::VerifyChecksum, |w| {
            w.i64(1).i64(2).i32(50);
        })
        .record(ReplayInputType::RequestPause, |_| {})
        .record(ReplayInputType::VerifyChecksum, |w| {
            w.i64(7).i64(9).i32(50);
        })
        .record(ReplayInputType::Advance, |w| {
            w.i32(5);
        })
        .record(ReplayInputType::VerifyChecksum, |w| {
            w.i64(6).i64(8).i32(0);
        })
        .record(ReplayInputType::RequestResume, |_| {})
        .record(ReplayInputType::VerifyChecksum, |w| {
            w.i64(3).i64(5).i32(0);
        })
        .record(ReplayInputType::EndGame, |_| {})
    }

    /// A complete SCFA replay: the sample header followed by the sample body
    pub fn sample_replay() -> Vec<u8> {
        let mut writer = ReplayWriter::new();
        writer.sample_header().sample_body();
        writer.into_inner()
    }
}
