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
use std::error::Error;
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{debug, error, info, span, Level};

use crate::config;
use crate::engine::TriggerEngine;

pub mod keyboard;
pub mod midi;

/// Controller events that drive the trigger engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Presses the pad at the given index.
    Press(usize),

    /// Releases the pad at the given index.
    Release(usize),
}

pub trait Driver: Send + Sync + 'static {
    /// Starts watching the driver's input and sends events until the input
    /// ends. Dropping every sender closes the controller.
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>>;
}

/// Creates the driver described by the configuration.
pub fn driver_for(config: &config::Controller) -> Result<Arc<dyn Driver>, Box<dyn Error>> {
    let driver: Arc<dyn Driver> = match config {
        config::Controller::Keyboard => Arc::new(keyboard::Driver::new()),
        config::Controller::Midi(midi_config) => midi::Driver::new(midi_config)?,
    };
    Ok(driver)
}

/// Plays an instrument from a driver.
pub struct Controller {
    handle: JoinHandle<()>,
}

impl Controller {
    /// Creates a new controller with the given driver.
    pub fn new(engine: Arc<TriggerEngine>, driver: Arc<dyn Driver>) -> Controller {
        Controller {
            handle: tokio::spawn(async move { Controller::trigger_events(engine, driver).await }),
        }
    }

    /// Join will block until the controller finishes.
    pub async fn join(&mut self) -> Result<(), JoinError> {
        (&mut self.handle).await
    }

    /// Triggers pads by watching the driver and getting events from it.
    async fn trigger_events(engine: Arc<TriggerEngine>, driver: Arc<dyn Driver>) {
        let span = span!(Level::INFO, "controller");
        let _enter = span.enter();

        let (events_tx, mut events_rx) = mpsc::channel(16);
        let join_handle = driver.monitor_events(events_tx);

        info!("Controller started.");

        while let Some(event) = events_rx.recv().await {
            debug!(event = ?event, "Received event.");

            if let Err(e) = match event {
                Event::Press(pad) => engine.press(pad),
                Event::Release(pad) => engine.release(pad),
            } {
                error!(err = %e, event = ?event, "Error triggering pad");
            }
        }

        info!("Controller closing.");
        match join_handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(err = %e, "Event monitor stopped with an error"),
            Err(e) => error!(err = %e, "Error waiting for event monitor to stop"),
        }
    }
}
