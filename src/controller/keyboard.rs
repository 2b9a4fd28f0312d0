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
use std::io;

use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{info, span, warn, Level};

use super::Event;

const PRESS: &str = "press";
const RELEASE: &str = "release";
const QUIT: &str = "quit";

/// A controller that plays pads from lines typed on the keyboard, e.g.
/// "press 3" or "r 3". A pad sounds from its press until its release.
pub struct Driver {}

impl Driver {
    pub fn new() -> Driver {
        Driver {}
    }

    /// Parses one line of input into the events it stands for.
    fn parse(input: &str) -> Option<Event> {
        let mut words = input.split_whitespace();
        let command = words.next()?.to_lowercase();
        let pad: usize = words.next()?.parse().ok()?;
        if words.next().is_some() {
            return None;
        }

        if matches_command(&command, PRESS) {
            Some(Event::Press(pad))
        } else if matches_command(&command, RELEASE) {
            Some(Event::Release(pad))
        } else {
            None
        }
    }

    /// Reads and handles one line. Returns false once input has ended.
    fn monitor_io<R, W>(
        events_tx: &Sender<Event>,
        mut reader: R,
        mut writer: W,
    ) -> Result<bool, io::Error>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(
            writer,
            "Command ({} <pad>, {} <pad>, {}): ",
            PRESS, RELEASE, QUIT,
        )?;
        writer.flush()?;
        let mut input: String = String::default();
        if reader.read_line(&mut input)? == 0 {
            return Ok(false);
        }

        let trimmed = input.trim().to_lowercase();
        if trimmed.is_empty() {
            return Ok(true);
        }
        if matches_command(&trimmed, QUIT) {
            return Ok(false);
        }

        match Driver::parse(&trimmed) {
            Some(event) => events_tx.blocking_send(event).map_err(io::Error::other)?,
            None => warn!(input = trimmed, "Unrecognized input"),
        }
        Ok(true)
    }
}

impl Default for Driver {
    fn default() -> Self {
        Driver::new()
    }
}

/// Commands may be given in full or by their first letter.
fn matches_command(input: &str, command: &str) -> bool {
    input == command || (input.len() == 1 && command.starts_with(input))
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "keyboard driver");
            let _enter = span.enter();

            info!("Keyboard driver started.");

            while Self::monitor_io(&events_tx, io::stdin().lock(), io::stdout())? {}

            info!("Keyboard input ended.");
            Ok(())
        })
    }
}
