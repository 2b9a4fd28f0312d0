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
use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::Deserialize;

pub use self::audio::Audio;
pub use self::controller::{Controller, MidiController};
pub use self::error::ConfigError;

mod audio;
mod controller;
mod error;

/// Default velocity for pad triggers.
pub const DEFAULT_VELOCITY: u8 = 90;

/// Default MIDI channel for pad triggers (1-indexed, the percussion channel).
pub const DEFAULT_CHANNEL: u8 = 10;

/// The configuration for the instrument.
#[derive(Deserialize, Clone, Debug)]
pub struct Instrument {
    /// The kit directory holding one WAV file per pad.
    samples: PathBuf,
    /// The audio output configuration.
    #[serde(default)]
    audio: Audio,
    /// How pads trigger voices.
    #[serde(default)]
    trigger: Trigger,
    /// The controller configuration.
    #[serde(default = "default_controller")]
    controller: Controller,
    /// The directory the config was read from, for resolving relative paths.
    #[serde(skip)]
    base_path: PathBuf,
}

fn default_controller() -> Controller {
    Controller::Keyboard
}

impl Instrument {
    /// Parse an instrument configuration from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Instrument, ConfigError> {
        let mut instrument = Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Instrument>()?;
        instrument.base_path = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(instrument)
    }

    /// The kit directory. Relative paths are resolved against the config file.
    pub fn samples(&self) -> PathBuf {
        if self.samples.is_absolute() {
            self.samples.clone()
        } else {
            self.base_path.join(&self.samples)
        }
    }

    /// Gets the audio configuration.
    pub fn audio(&self) -> &Audio {
        &self.audio
    }

    /// Gets the trigger configuration.
    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    /// Gets the controller configuration.
    pub fn controller(&self) -> &Controller {
        &self.controller
    }
}

/// Velocity and channel used for every pad trigger.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct Trigger {
    /// The velocity voices start with (0-127).
    velocity: Option<u8>,
    /// The MIDI channel voices are grouped under (1-16).
    channel: Option<u8>,
}

impl Trigger {
    /// Gets the trigger velocity, clamped to the MIDI range.
    pub fn velocity(&self) -> u8 {
        self.velocity.unwrap_or(DEFAULT_VELOCITY).min(127)
    }

    /// Gets the trigger channel, clamped to 1-16.
    pub fn channel(&self) -> u8 {
        self.channel.unwrap_or(DEFAULT_CHANNEL).clamp(1, 16)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_full_config() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("drumpad.yaml");
        fs::write(
            &path,
            r#"
samples: kits/acoustic
audio:
  device: "Scarlett 2i2"
  sample_rate: 48000
  buffer_size: 128
trigger:
  velocity: 100
  channel: 9
controller:
  kind: midi
  device: "Pad Controller"
  channel: 10
"#,
        )?;

        let instrument = Instrument::deserialize(&path)?;
        assert_eq!(instrument.samples(), dir.path().join("kits/acoustic"));
        assert_eq!(instrument.audio().device(), "Scarlett 2i2");
        assert_eq!(instrument.audio().sample_rate(), 48000);
        assert_eq!(instrument.audio().buffer_size(), Some(128));
        assert_eq!(instrument.trigger().velocity(), 100);
        assert_eq!(instrument.trigger().channel(), 9);
        match instrument.controller() {
            Controller::Midi(midi) => {
                assert_eq!(midi.device(), "Pad Controller");
                assert_eq!(midi.channel(), Some(10));
            }
            other => panic!("unexpected controller {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_minimal_config_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("drumpad.yaml");
        fs::write(&path, "samples: /opt/kits/808\n")?;

        let instrument = Instrument::deserialize(&path)?;
        assert_eq!(instrument.samples(), PathBuf::from("/opt/kits/808"));
        assert_eq!(instrument.audio().device(), "default");
        assert_eq!(instrument.audio().sample_rate(), 44100);
        assert_eq!(instrument.audio().buffer_size(), None);
        assert_eq!(instrument.trigger().velocity(), DEFAULT_VELOCITY);
        assert_eq!(instrument.trigger().channel(), DEFAULT_CHANNEL);
        assert!(matches!(instrument.controller(), Controller::Keyboard));
        Ok(())
    }

    #[test]
    fn test_missing_samples_is_an_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("drumpad.yaml");
        fs::write(&path, "audio:\n  device: default\n")?;

        assert!(Instrument::deserialize(&path).is_err());
        Ok(())
    }

    #[test]
    fn test_trigger_values_are_clamped() {
        let trigger = Trigger {
            velocity: Some(200),
            channel: Some(0),
        };
        assert_eq!(trigger.velocity(), 127);
        assert_eq!(trigger.channel(), 1);
    }
}
