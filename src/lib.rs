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
//! A sample-backed 16-pad drum instrument.
//!
//! Each pad is bound to a MIDI note and a sample loaded from a kit directory.
//! Pressing a pad starts its sample as a voice on the audio output, releasing
//! it stops the voice.

pub mod audio;
pub mod config;
pub mod controller;
pub mod engine;
pub mod midi;
pub mod notes;
pub mod samples;
#[cfg(test)]
mod testutil;
