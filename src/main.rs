// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use stepgrid::config::{validate_config, ConfigEvent, ConfigWatcher, EngineConfig};
use stepgrid::control::midi_map::{status, step_pad_note, BUTTON_CHANNEL, PAD_CHANNEL};
use stepgrid::control::GridController;
use stepgrid::runtime::{spawn_transport_poller, EngineHandle, EngineRuntime};
use stepgrid::sequencer::{
    ClipBinding, GridReadModel, MemoryClip, PadSelection, StepSequencerEngine, VelocityTier,
};
use stepgrid::timing::{ticks_to_beats, Transport};

fn print_usage() {
    println!("STEPGRID - Grid step sequencer engine");
    println!();
    println!("Usage: stepgrid [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --demo [CONFIG]         Run a scripted editing session and print the grid");
    println!("  --check-config <FILE>   Validate a YAML or TOML config file");
    println!("  --watch <FILE>          Watch a config file and apply changes (Ctrl+C to stop)");
    println!("  --help                  Show this help message");
    println!();
    println!("Logging is controlled with RUST_LOG (e.g. RUST_LOG=stepgrid=debug)");
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

/// Text rendering of a read model, eight steps per row
fn render_grid(model: &GridReadModel) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "pitch {}  res {}  page {} @ beat {:.2}  lock {}  loop {}  tier {}  x2 {}  copy {}\n",
        model.pitch,
        model.resolution.label,
        model.page,
        ticks_to_beats(model.offset),
        if model.bar_lock { "on" } else { "off" },
        model
            .loop_bars
            .map(|b| format!("{} bars", b))
            .unwrap_or_else(|| "-".to_string()),
        model.tier.name(),
        if model.double_time { "on" } else { "off" },
        model
            .staged_bar
            .map(|b| format!("bar {}", b + 1))
            .unwrap_or_else(|| "-".to_string()),
    ));
    for row in model.steps.chunks(8) {
        let cells: Vec<String> = row
            .iter()
            .map(|step| {
                let cell = match (step.active, step.tier) {
                    (true, Some(VelocityTier::Accent)) => 'A',
                    (true, Some(VelocityTier::Soft)) => 's',
                    (true, _) => 'o',
                    (false, _) if step.in_loop => '.',
                    (false, _) => ' ',
                };
                if step.is_playhead {
                    format!("[{}]", cell)
                } else {
                    format!(" {} ", cell)
                }
            })
            .collect();
        out.push_str(&cells.concat());
        out.push('\n');
    }
    out
}

/// Press and release a button, dispatching whatever the controller maps it to
async fn tap(
    controller: &mut GridController,
    handle: &EngineHandle,
    channel: u8,
    note: u8,
) -> Result<()> {
    hold(controller, handle, channel, note, true).await?;
    hold(controller, handle, channel, note, false).await
}

async fn hold(
    controller: &mut GridController,
    handle: &EngineHandle,
    channel: u8,
    note: u8,
    pressed: bool,
) -> Result<()> {
    let (status, velocity) = if pressed {
        (status::NOTE_ON, 127)
    } else {
        (status::NOTE_OFF, 0)
    };
    if let Some(intent) = controller.process_midi(channel, status, note, velocity) {
        match handle.dispatch(intent).await? {
            Ok(outcome) => println!("  {:?} -> {:?}", intent, outcome),
            Err(err) => println!("  {:?} rejected: {}", intent, err),
        }
    }
    Ok(())
}

async fn run_demo(config_path: Option<&Path>) -> Result<()> {
    let config = match config_path {
        Some(path) => validate_config(path)?,
        None => EngineConfig::default(),
    };
    let pads = PadSelection::new(config.grid.pitch);
    let mut controller = config.build_controller(pads.clone())?;
    let engine = StepSequencerEngine::new(config.to_settings());
    let runtime = EngineRuntime::spawn_with_pitch_source(engine, pads);
    let handle = runtime.handle();

    let clip = MemoryClip::new("Demo", 2).shared();
    handle.bind_clip(Box::new(clip.clone())).await?;

    println!("Kick on the beat:");
    for index in [0, 4, 8, 12] {
        tap(&mut controller, &handle, PAD_CHANNEL, step_pad_note(index)).await?;
    }

    println!("Accented snare on 2 and 4:");
    tap(&mut controller, &handle, PAD_CHANNEL, 66).await?;
    hold(&mut controller, &handle, PAD_CHANNEL, 86, true).await?;
    for index in [4, 12] {
        tap(&mut controller, &handle, PAD_CHANNEL, step_pad_note(index)).await?;
    }
    hold(&mut controller, &handle, PAD_CHANNEL, 86, false).await?;

    println!("Double time hat roll:");
    tap(&mut controller, &handle, PAD_CHANNEL, 74).await?;
    hold(&mut controller, &handle, PAD_CHANNEL, 93, true).await?;
    tap(&mut controller, &handle, PAD_CHANNEL, step_pad_note(14)).await?;
    hold(&mut controller, &handle, PAD_CHANNEL, 93, false).await?;

    println!("Copy bar 1 to bar 2:");
    tap(&mut controller, &handle, PAD_CHANNEL, 64).await?;
    tap(&mut controller, &handle, BUTTON_CHANNEL, 112).await?;
    tap(&mut controller, &handle, BUTTON_CHANNEL, 117).await?;

    let mut transport = Transport::new(config.transport.tempo);
    transport.set_loop(Some(2.0 * config.grid.beats_per_bar as f64));
    transport.start();
    let poller = spawn_transport_poller(handle.clone(), transport, Duration::from_millis(10));
    tokio::time::sleep(Duration::from_millis(750)).await;

    println!();
    print!("{}", render_grid(&handle.snapshot()));

    let engine = runtime.shutdown().await?;
    poller.await.map_err(|e| anyhow!("transport poller failed: {}", e))?;

    let loop_events = engine.loop_events()?;
    println!();
    println!(
        "Clip '{}' holds {} notes, {} in the {} bar loop",
        clip.name(),
        clip.with(|c| c.note_count()),
        loop_events.len(),
        clip.loop_length()
    );
    Ok(())
}

fn check_config(path: &Path) -> Result<()> {
    let config = validate_config(path)?;
    let settings = config.to_settings();
    println!("{:?}: OK", path);
    println!(
        "  grid {} steps, {} beats per bar, resolution {}, pitch {}",
        settings.width_steps, config.grid.beats_per_bar, config.grid.resolution, settings.default_pitch
    );
    println!(
        "  velocities soft {} / normal {} / accent {}",
        settings.velocities.soft, settings.velocities.normal, settings.velocities.accent
    );
    println!("  {} control override(s)", config.controls.len());
    Ok(())
}

async fn watch_config(path: PathBuf) -> Result<()> {
    let config = validate_config(&path)?;
    let runtime = EngineRuntime::spawn(StepSequencerEngine::new(config.to_settings()));
    let handle = runtime.handle();

    let watcher = ConfigWatcher::new(&path, None)?;
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    std::thread::spawn(move || {
        while let Some(event) = watcher.recv() {
            if tx.send(event).is_err() {
                break;
            }
        }
    });

    println!("Watching {:?} (press Ctrl+C to stop)...", path);
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = rx.recv() => match event {
                Some(ConfigEvent::Reloaded(config)) => {
                    handle.apply_settings(config.to_settings()).await?;
                    println!("Reloaded: {} steps", config.grid.width);
                    print!("{}", render_grid(&handle.snapshot()));
                }
                Some(ConfigEvent::Error(message)) => eprintln!("{}", message),
                None => break,
            },
        }
    }

    runtime.shutdown().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("STEPGRID - Grid step sequencer engine");
        println!("Run with --help for usage information");
        return Ok(());
    }

    match args[1].as_str() {
        "--demo" => {
            run_demo(args.get(2).map(Path::new)).await?;
        }
        "--check-config" => {
            let Some(path) = args.get(2) else {
                eprintln!("Error: --check-config requires a file");
                std::process::exit(1);
            };
            check_config(Path::new(path))?;
        }
        "--watch" => {
            let Some(path) = args.get(2) else {
                eprintln!("Error: --watch requires a file");
                std::process::exit(1);
            };
            watch_config(PathBuf::from(path)).await?;
        }
        "--help" | "-h" => {
            print_usage();
        }
        _ => {
            eprintln!("Unknown option: {}", args[1]);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
