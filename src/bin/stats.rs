//! Print how often each kind of input record occurs in a replay.

use fafreplay::{chat_messages, load_replay_from_stream, ReplayInputType, ReplayType};
use std::collections::BTreeMap;
use std::error;
use std::fs::File;
use std::io::BufReader;

#[derive(Debug, Default)]
struct Stats {
    counts: BTreeMap<u8, u32>,
    total: u32,
    last_tick: i32,
    sources: u8,
}

impl Stats {
    fn update(&mut self, kind: ReplayInputType, tick: i32, source: u8) {
        *self.counts.entry(kind.value()).or_default() += 1;
        self.total += 1;
        self.last_tick = self.last_tick.max(tick);
        self.sources = self.sources.max(source.saturating_add(1));
    }
}

impl std::fmt::Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let total = f64::from(self.total.max(1));
        for (&tag, &count) in &self.counts {
            let Some(kind) = ReplayInputType::new(tag) else {
                continue;
            };

            let name = format!("{:?}:", kind);
            writeln!(
                f,
                "{:<26}{:<8}({:.2}%)",
                name,
                count,
                f64::from(count) / total * 100.0
            )?;
        }

        writeln!(f, "total:\t\t\t  {}", self.total)?;
        writeln!(f, "ticks:\t\t\t  {}", self.last_tick)?;
        writeln!(f, "sources:\t\t  {}", self.sources)
    }
}

fn main() -> Result<(), Box<dyn error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: {} <replay>", args[0]);
        std::process::exit(1);
    }

    let path = &args[1];
    let Some(replay_type) = ReplayType::from_path(path) else {
        eprintln!("Error: expected a .fafreplay or .SCFAReplay file, got '{}'", path);
        std::process::exit(1);
    };

    let file = BufReader::new(File::open(path)?);
    let replay = load_replay_from_stream(file, replay_type)?;

    let mut stats = Stats::default();
    for input in &replay.body.user_input {
        stats.update(input.kind.input_type(), input.tick, input.source);
    }

    print!("{}", stats);
    println!("chat:\t\t\t  {}", chat_messages(&replay).len());
    println!("in sync:\t\t  {}", replay.body.in_sync);
    Ok(())
}
