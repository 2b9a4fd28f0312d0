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
use serde::Deserialize;

/// Allows users to specify the surface that plays the pads.
#[derive(Deserialize, Clone, Debug)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Controller {
    Keyboard,
    Midi(MidiController),
}

/// The configuration for playing pads from a MIDI input.
#[derive(Deserialize, Clone, Debug)]
pub struct MidiController {
    /// The MIDI input device.
    device: String,
    /// Only listen on this channel (1-16). When unset, every channel is accepted.
    channel: Option<u8>,
}

impl MidiController {
    /// Gets the MIDI input device name.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Gets the channel to listen on, if restricted.
    pub fn channel(&self) -> Option<u8> {
        self.channel
    }
}
