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
use std::{error::Error, fmt, sync::Arc};

use crate::config;
use crate::samples::{PcmBuffer, SampleLibrary};

pub mod cpal;
pub mod mixer;
pub mod mock;
mod thread_priority;

/// The audio stage pads play through. Implementations must not block the caller
/// on audio work: starting or stopping a voice should only hand it off.
pub trait Output: fmt::Display + Send + Sync {
    /// Attaches the loaded samples to the output and brings up the audio stream.
    /// Called once, before any voice is started.
    fn attach(&self, library: &SampleLibrary) -> Result<(), Box<dyn Error>>;

    /// Starts playing the buffer as a voice keyed by note and channel (1-indexed).
    fn start_voice(
        &self,
        buffer: &PcmBuffer,
        note: u8,
        velocity: u8,
        channel: u8,
    ) -> Result<(), Box<dyn Error>>;

    /// Stops the voice keyed by note and channel. Stopping a voice that already
    /// finished is not an error.
    fn stop_voice(&self, note: u8, channel: u8) -> Result<(), Box<dyn Error>>;
}

/// Lists output devices known to cpal.
pub fn list_devices() -> Result<Vec<String>, Box<dyn Error>> {
    cpal::Output::list()
}

/// Gets an output for the given configuration. Device names starting with
/// "mock" select a silent output that only records what it was asked to do.
pub fn get_output(config: &config::Audio) -> Result<Arc<dyn Output>, Box<dyn Error>> {
    let device = config.device();
    if device.starts_with("mock") {
        return Ok(Arc::new(mock::Output::get(device)));
    };

    Ok(Arc::new(cpal::Output::new(config.clone())))
}
