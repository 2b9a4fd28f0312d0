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

//! Pad sample loading.
//!
//! This module provides:
//! - Decoded, in-memory PCM buffers shared between voices
//! - Resolution of pad resource names to decoded buffers
//! - The per-pad sample library with isolated load failures

mod buffer;
mod decode;
mod library;
mod resolver;

pub use buffer::PcmBuffer;
pub use decode::SampleSourceError;
pub use library::{LoadError, LoadErrorReason, LoadReport, SampleLibrary};
pub use resolver::{DirectoryResolver, Resolver};

#[cfg(test)]
pub use resolver::test::MapResolver;
