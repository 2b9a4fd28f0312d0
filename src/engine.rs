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

//! The trigger engine turns pad presses and releases into voices.
//!
//! Each pad has at most one live voice. A press starts the pad's sample, the
//! matching release stops it. Pads whose sample failed to load never sound.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::audio::Output;
use crate::config;
use crate::notes::{self, InvalidPadIndex, PadIndex, PAD_COUNT};
use crate::samples::SampleLibrary;

pub use self::state::{PadEvent, PadState};

mod state;

/// Errors returned by trigger calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TriggerError {
    #[error(transparent)]
    InvalidPadIndex(#[from] InvalidPadIndex),
}

/// The output couldn't be brought up for the loaded library.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unable to initialize instrument on {output}: {reason}")]
pub struct InstrumentInitError {
    pub output: String,
    pub reason: String,
}

/// Velocity and channel every pad voice starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerSettings {
    pub velocity: u8,
    /// 1-indexed MIDI channel.
    pub channel: u8,
}

impl Default for TriggerSettings {
    fn default() -> Self {
        TriggerSettings {
            velocity: config::DEFAULT_VELOCITY,
            channel: config::DEFAULT_CHANNEL,
        }
    }
}

impl From<&config::Trigger> for TriggerSettings {
    fn from(trigger: &config::Trigger) -> Self {
        TriggerSettings {
            velocity: trigger.velocity(),
            channel: trigger.channel(),
        }
    }
}

/// The note and channel a live voice was started with, so the release stops
/// exactly what the press started.
struct Voice {
    note: u8,
    channel: u8,
}

pub struct TriggerEngine {
    library: SampleLibrary,
    output: Arc<dyn Output>,
    settings: TriggerSettings,
    /// One slot per pad. Every transition happens under this lock, including
    /// the call into the output.
    voices: Mutex<[Option<Voice>; PAD_COUNT]>,
    state: Arc<PadState>,
}

impl TriggerEngine {
    /// Attaches the loaded library to the output and returns an engine ready
    /// for triggers.
    pub fn new(
        library: SampleLibrary,
        output: Arc<dyn Output>,
        settings: TriggerSettings,
    ) -> Result<TriggerEngine, InstrumentInitError> {
        if let Err(e) = output.attach(&library) {
            error!(output = %output, err = %e, "Unable to attach output");
            return Err(InstrumentInitError {
                output: output.to_string(),
                reason: e.to_string(),
            });
        }

        info!(
            output = %output,
            loaded = library.loaded_count(),
            velocity = settings.velocity,
            channel = settings.channel,
            "Trigger engine ready"
        );

        Ok(TriggerEngine {
            library,
            output,
            settings,
            voices: Mutex::new(std::array::from_fn(|_| None)),
            state: Arc::new(PadState::new()),
        })
    }

    /// Presses a pad. Pressing a pad that is already sounding, or whose sample
    /// didn't load, does nothing.
    pub fn press(&self, pad: usize) -> Result<(), TriggerError> {
        let pad = validate(pad)?;
        let Some(buffer) = self.library.get(pad) else {
            debug!(pad = pad.get(), "Pad has no sample, ignoring press");
            return Ok(());
        };

        let mut voices = self.voices.lock();
        if voices[pad.get()].is_some() {
            debug!(pad = pad.get(), "Pad already sounding");
            return Ok(());
        }

        let note = notes::note(pad);
        let TriggerSettings { velocity, channel } = self.settings;
        if let Err(e) = self.output.start_voice(buffer, note, velocity, channel) {
            error!(pad = pad.get(), note, err = %e, "Unable to start voice");
            return Ok(());
        }

        voices[pad.get()] = Some(Voice { note, channel });
        self.state.set(pad, true);
        debug!(pad = pad.get(), note, velocity, channel, "Pad started");
        self.state.publish(PadEvent::Started(pad));
        Ok(())
    }

    /// Releases a pad. Releasing a pad that isn't sounding does nothing.
    pub fn release(&self, pad: usize) -> Result<(), TriggerError> {
        let pad = validate(pad)?;
        let mut voices = self.voices.lock();
        self.stop(&mut voices, pad);
        Ok(())
    }

    /// Releases every sounding pad.
    pub fn stop_all(&self) {
        let mut voices = self.voices.lock();
        for pad in PadIndex::all() {
            self.stop(&mut voices, pad);
        }
    }

    fn stop(&self, voices: &mut [Option<Voice>; PAD_COUNT], pad: PadIndex) {
        let Some(voice) = voices[pad.get()].take() else {
            return;
        };

        self.state.set(pad, false);
        // A voice that already ran out is gone from the mix; stopping it is harmless.
        if let Err(e) = self.output.stop_voice(voice.note, voice.channel) {
            error!(pad = pad.get(), note = voice.note, err = %e, "Unable to stop voice");
        }
        debug!(pad = pad.get(), note = voice.note, "Pad stopped");
        self.state.publish(PadEvent::Stopped(pad));
    }

    /// True while the pad is sounding.
    pub fn is_sounding(&self, pad: PadIndex) -> bool {
        self.state.is_sounding(pad)
    }

    /// The shared pad state, for observers that outlive a borrow of the engine.
    pub fn state(&self) -> Arc<PadState> {
        self.state.clone()
    }

    /// Subscribes to pad events.
    pub fn subscribe(&self) -> crossbeam_channel::Receiver<PadEvent> {
        self.state.subscribe()
    }
}

fn validate(pad: usize) -> Result<PadIndex, TriggerError> {
    PadIndex::new(pad).map_err(|e| {
        warn!(pad, "Ignoring trigger for invalid pad");
        TriggerError::from(e)
    })
}
