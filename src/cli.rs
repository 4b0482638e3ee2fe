use anyhow::{Result, anyhow};
use pico_args::Arguments;
use std::{env, fs, path::PathBuf};

use crate::config::Tuning;
use crate::engine::Gesture;
use crate::replay::{self, Capture};

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    // Flags-based help (-h/--help)
    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    let config_path: Option<PathBuf> = pargs.opt_value_from_str("--config")?;

    // First free arg is the subcommand
    let subcmd: Option<String> = pargs.free_from_str().ok();

    match subcmd.as_deref() {
        Some("help") => {
            print_help();
            Ok(())
        }

        Some("replay") => {
            let path: PathBuf = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: wavectl replay <capture.json> [--config <path>]"))?;
            let tuning = Tuning::load_or_default(config_path.as_deref())?;
            let txt = fs::read_to_string(&path)
                .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
            let capture = Capture::from_json(&txt)?;

            let events = replay::run_capture(&capture, &tuning);
            if events.is_empty() {
                println!("no gestures detected");
            }
            for (at_ms, gesture) in events {
                println!("{at_ms:>6} ms  {gesture}");
            }
            Ok(())
        }

        Some("simulate") => {
            let kind: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: wavectl simulate <up|down|left|right|hold>"))?;
            let gesture = parse_gesture(&kind)?;
            let tuning = Tuning::load_or_default(config_path.as_deref())?;

            let capture = replay::synth_capture(gesture, &tuning)?;
            let events = replay::run_capture(&capture, &tuning);
            for (at_ms, g) in &events {
                println!("{at_ms:>6} ms  {g}");
            }
            if events.iter().any(|(_, g)| *g == gesture) {
                println!("ok: engine reproduced '{gesture}'");
                Ok(())
            } else {
                Err(anyhow!(
                    "engine did not reproduce '{gesture}' ({} event(s) fired)",
                    events.len()
                ))
            }
        }

        Some("check") => {
            let path: Option<PathBuf> = pargs.free_from_str().ok();
            let tuning = match &path {
                Some(p) => Tuning::load(p)?,
                None => Tuning::load_or_default(None)?,
            };
            let source = path
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "defaults".to_string());
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "source": source,
                    "tuning": tuning,
                }))?
            );
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

fn parse_gesture(kind: &str) -> Result<Gesture> {
    match kind {
        "up" => Ok(Gesture::Up),
        "down" => Ok(Gesture::Down),
        "left" => Ok(Gesture::Left),
        "right" => Ok(Gesture::Right),
        "hold" => Ok(Gesture::Hold),
        other => Err(anyhow!("unknown gesture kind: {other}")),
    }
}

fn print_help() {
    println!(
        r#"wavectl — optical gesture sensor engine

USAGE:
  wavectl help                              Show this help
  wavectl replay <capture.json>             Run a recorded capture through the engine
  wavectl simulate <up|down|left|right|hold> Synthesize a gesture and classify it
  wavectl check [tuning.toml]               Validate tuning and print effective values

OPTIONS:
  --config <path>   Tuning file to use (default: ~/.config/wavectl/engine.toml)

CAPTURE FORMAT (JSON):
  {{ "frames": [ {{ "at_ms": 0, "samples": [[u, d, l, r], ...], "present": true }} ] }}
"#
    );
}
