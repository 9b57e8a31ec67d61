//! Dump a decoded replay as JSON to stdout.

use fafreplay::{load_replay_from_stream, ReplayType};
use std::error;
use std::fs::File;
use std::io::{self, BufReader, Write};

fn main() -> Result<(), Box<dyn error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 || args.len() > 3 {
        eprintln!("Usage: {} <replay> [--pretty]", args[0]);
        std::process::exit(1);
    }

    let path = &args[1];
    let pretty = args.get(2).is_some_and(|x| x == "--pretty");
    let Some(replay_type) = ReplayType::from_path(path) else {
        eprintln!("Error: expected a .fafreplay or .SCFAReplay file, got '{}'", path);
        std::process::exit(1);
    };

    let file = BufReader::new(File::open(path)?);
    let replay = load_replay_from_stream(file, replay_type)?;

    let mut stdout = io::stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(&mut stdout, &replay)?;
    } else {
        serde_json::to_writer(&mut stdout, &replay)?;
    }
    writeln!(stdout)?;
    Ok(())
}
