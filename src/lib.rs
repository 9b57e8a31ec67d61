/*!

A decoder for [Supreme Commander: Forged
Alliance](https://en.wikipedia.org/wiki/Supreme_Commander:_Forged_Alliance) replays,
both as written by the game (`.SCFAReplay`) and as served by
[FAForever](https://www.faforever.com/) (`.fafreplay`).

## Features

- ✔ Complete: every input record the engine writes is decoded
- ✔ Resumable: decode a replay in batches and report progress between them
- ✔ Safe: corrupt replays are reported as errors, never panics
- ✔ Serializable: decoded replays can be dumped with [serde](https://serde.rs/)

## Quick Start

```rust,no_run
use fafreplay::{chat_messages, load_faf_replay_from_disk};

let replay = load_faf_replay_from_disk("assets/faforever/zstd/22338092.fafreplay")?;
println!("{} on {:?}", replay.header.game_version, replay.header.scenario.map.name);
println!("{} inputs", replay.body.user_input.len());
for message in chat_messages(&replay) {
    println!("[{}] {} to {}: {}", message.tick, message.sender, message.receiver, message.text);
}
# Ok::<(), fafreplay::Error>(())
```

## Resumable Decoding

Decoding can be split up so that a host stays responsive. Each step decodes
at most a batch of input records.

```rust,no_run
use fafreplay::{ReplayLoader, ReplayLoadingStage, ReplayType};

let data = std::fs::read("assets/faforever/gzip/22451957.fafreplay")?;
let loader = ReplayLoader::builder().batch_size(500).build();
let mut stage = loader.stages(data, ReplayType::ForgedAllianceForever);
while !stage.is_terminal() {
    stage = loader.process(stage)?;
    if let Some(percent) = stage.percent_complete() {
        println!("{}%", percent);
    }
}

match stage {
    ReplayLoadingStage::Complete(complete) => {
        let replay = complete.into_replay();
        println!("{} inputs", replay.body.user_input.len());
    }
    ReplayLoadingStage::Failed(e) => eprintln!("unreadable replay: {}", e),
    _ => unreachable!(),
}
# Ok::<(), Box<dyn std::error::Error>>(())
```

## Low Level

The decoders for the individual parts of a replay stream are exposed and all
operate on a [`ReplayReader`].

```rust
use fafreplay::{read_lua_data, LuaData, ReplayReader};

let data = [0x01, b'h', b'i', 0x00];
let mut reader = ReplayReader::new(&data);
assert_eq!(read_lua_data(&mut reader)?, LuaData::String(String::from("hi")));
assert!(reader.is_exhausted());
# Ok::<(), fafreplay::Error>(())
```
*/

#![warn(missing_debug_implementations)]

mod command;
pub mod envelope;
mod errors;
mod header;
mod input;
mod loader;
mod lua;
mod reader;
mod replay;
mod semantics;
mod stage;

#[cfg(test)]
mod test_utils;

pub use self::command::*;
pub use self::errors::*;
pub use self::header::*;
pub use self::input::*;
pub use self::loader::*;
pub use self::lua::*;
pub use self::reader::*;
pub use self::replay::*;
pub use self::semantics::*;
pub use self::stage::*;
