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
use std::{
    error::Error,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;
use tracing::{info, span, Level};

use crate::samples::{PcmBuffer, SampleLibrary};

/// Something a mock output was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Attach { loaded: usize },
    Start {
        note: u8,
        velocity: u8,
        channel: u8,
        frames: usize,
    },
    Stop { note: u8, channel: u8 },
}

/// A mock output. Doesn't play anything, only records calls.
#[derive(Clone)]
pub struct Output {
    name: String,
    calls: Arc<Mutex<Vec<Call>>>,
    fail_attach: Arc<AtomicBool>,
    fail_start: Arc<AtomicBool>,
}

impl Output {
    /// Gets the given mock output.
    pub fn get(name: &str) -> Output {
        Output {
            name: name.to_string(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_attach: Arc::new(AtomicBool::new(false)),
            fail_start: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Makes subsequent attach calls fail.
    #[cfg(test)]
    pub fn fail_attach(&self, fail: bool) {
        self.fail_attach.store(fail, Ordering::Relaxed);
    }

    /// Makes subsequent start_voice calls fail.
    #[cfg(test)]
    pub fn fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::Relaxed);
    }

    /// Every recorded call, oldest first.
    #[cfg(test)]
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    #[cfg(test)]
    pub fn starts(&self) -> Vec<Call> {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, Call::Start { .. }))
            .cloned()
            .collect()
    }

    #[cfg(test)]
    pub fn stops(&self) -> Vec<Call> {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, Call::Stop { .. }))
            .cloned()
            .collect()
    }
}

impl super::Output for Output {
    fn attach(&self, library: &SampleLibrary) -> Result<(), Box<dyn Error>> {
        let span = span!(Level::INFO, "attach (mock)");
        let _enter = span.enter();

        if self.fail_attach.load(Ordering::Relaxed) {
            return Err(format!("mock output {} refused to attach", self.name).into());
        }

        let loaded = library.loaded_count();
        info!(device = self.name, loaded, "Mock output attached");
        self.calls.lock().push(Call::Attach { loaded });
        Ok(())
    }

    fn start_voice(
        &self,
        buffer: &PcmBuffer,
        note: u8,
        velocity: u8,
        channel: u8,
    ) -> Result<(), Box<dyn Error>> {
        if self.fail_start.load(Ordering::Relaxed) {
            return Err("mock output refused to start a voice".into());
        }

        self.calls.lock().push(Call::Start {
            note,
            velocity,
            channel,
            frames: buffer.frames(),
        });
        Ok(())
    }

    fn stop_voice(&self, note: u8, channel: u8) -> Result<(), Box<dyn Error>> {
        self.calls.lock().push(Call::Stop { note, channel });
        Ok(())
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
