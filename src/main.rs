// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use clap::{crate_version, Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use drumpad::controller::{self, Controller};
use drumpad::engine::{PadEvent, TriggerEngine, TriggerSettings};
use drumpad::notes::{self, PadIndex};
use drumpad::samples::{DirectoryResolver, SampleLibrary};
use drumpad::{audio, config, midi};

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A sample-backed 16-pad drum instrument."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the pads with their notes and the sample names they load.
    Pads {},
    /// Loads a kit directory and reports which pads are playable.
    Verify {
        /// The kit directory.
        path: PathBuf,
        /// The sample rate samples are converted to.
        #[arg(short, long, default_value_t = 44100)]
        sample_rate: u32,
    },
    /// Lists the available audio output devices.
    Devices {},
    /// Lists the available MIDI input devices.
    MidiDevices {},
    /// Start will load the kit and play it from the configured controller.
    Start {
        /// The path to the instrument config.
        config_path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Pads {} => {
            println!("Pads (count: {}):", notes::PAD_COUNT);
            for pad in PadIndex::all() {
                println!(
                    "- {:>2}: note {} ({}) {} -> {}.wav",
                    pad,
                    notes::note(pad),
                    notes::note_name(pad),
                    notes::display_name(pad),
                    notes::resource_name(pad),
                );
            }
        }
        Commands::Verify { path, sample_rate } => {
            let library = SampleLibrary::load_all(&DirectoryResolver::new(&path, sample_rate));
            let report = library.report();
            println!("{}", report);

            if report.loaded == 0 {
                return Err(format!("no samples could be loaded from {}", path.display()).into());
            }
            println!(
                "Memory used: {} KiB",
                library.memory_usage().div_ceil(1024)
            );
        }
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices.iter() {
                println!("- {}", device);
            }
        }
        Commands::MidiDevices {} => {
            let devices = midi::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices.iter() {
                println!("- {}", device);
            }
        }
        Commands::Start { config_path } => {
            let instrument = config::Instrument::deserialize(&config_path)?;
            let resolver =
                DirectoryResolver::new(&instrument.samples(), instrument.audio().sample_rate());
            let library = SampleLibrary::load_all(&resolver);
            if library.loaded_count() == 0 {
                warn!(kit = %resolver, "No samples loaded, every pad is silent");
            }

            let output = audio::get_output(instrument.audio())?;
            let engine = Arc::new(TriggerEngine::new(
                library,
                output,
                TriggerSettings::from(instrument.trigger()),
            )?);

            // Ends once the engine and its state are dropped.
            let events = engine.subscribe();
            thread::spawn(move || {
                for event in events {
                    match event {
                        PadEvent::Started(pad) => info!(
                            pad = pad.get(),
                            name = notes::display_name(pad),
                            "Pad started"
                        ),
                        PadEvent::Stopped(pad) => info!(
                            pad = pad.get(),
                            name = notes::display_name(pad),
                            "Pad stopped"
                        ),
                    }
                }
            });

            let driver = controller::driver_for(instrument.controller())?;
            let mut controller = Controller::new(engine.clone(), driver);
            controller.join().await?;

            engine.stop_all();
        }
    }

    Ok(())
}
