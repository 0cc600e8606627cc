//! Line-oriented harness: one snapshot JSON per stdin line in, one action
//! map JSON per stdout line out. Logs go to stderr.

use log::*;
use lux_dispatch::*;
use std::io::{self, BufRead, Write};
use std::path::Path;

fn load_tuning() -> Tuning {
    match std::env::args().nth(1) {
        Some(path) => match Tuning::from_file(Path::new(&path)) {
            Ok(tuning) => {
                info!("loaded tuning from {}", path);
                tuning
            }
            Err(err) => {
                warn!("{}, using builtin tuning", err);
                Tuning::builtin()
            }
        },
        None => Tuning::builtin(),
    }
}

fn main() -> io::Result<()> {
    env_logger::init();

    let mut agent = Agent::new(load_tuning());
    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let actions = match Snapshot::from_json_str(&line) {
            Ok(snapshot) => agent.act(&snapshot),
            Err(err) => {
                error!("skipping turn: {}", err);
                TurnActions::new()
            }
        };

        match serde_json::to_string(&actions) {
            Ok(json) => writeln!(stdout, "{}", json)?,
            Err(err) => {
                error!("failed to encode actions: {}", err);
                writeln!(stdout, "{{}}")?;
            }
        }
        stdout.flush()?;
    }

    Ok(())
}
