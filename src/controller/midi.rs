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
use std::{error::Error, io, sync::Arc};

use midly::{live::LiveEvent, MidiMessage};
use tokio::{
    sync::mpsc::{self, Sender},
    task::JoinHandle,
};
use tracing::{debug, error, info, span, Level};

use super::Event;
use crate::{config, midi, notes};

/// A controller that plays pads from a MIDI input. Notes map onto pads
/// through the instrument's note table.
pub struct Driver {
    /// The MIDI device.
    midi_device: Arc<dyn midi::Device>,
    /// Only notes on this channel (1-16) are played. Unset accepts every channel.
    channel: Option<u8>,
}

impl Driver {
    pub fn new(config: &config::MidiController) -> Result<Arc<Self>, Box<dyn Error>> {
        Ok(Driver::from_device(
            midi::get_device(config.device())?,
            config.channel(),
        ))
    }

    pub fn from_device(midi_device: Arc<dyn midi::Device>, channel: Option<u8>) -> Arc<Self> {
        Arc::new(Driver {
            midi_device,
            channel,
        })
    }
}

/// Translates a raw MIDI message into a pad event. Note on presses, note off
/// (or note on with zero velocity) releases; anything else is ignored.
fn to_event(raw_event: &[u8], channel: Option<u8>) -> Option<Event> {
    let event = match LiveEvent::parse(raw_event) {
        Ok(event) => event,
        Err(e) => {
            error!(err = ?e, "Error parsing event.");
            return None;
        }
    };

    let LiveEvent::Midi {
        channel: event_channel,
        message,
    } = event
    else {
        return None;
    };
    if channel.is_some_and(|channel| event_channel.as_int() + 1 != channel) {
        return None;
    }

    let (key, pressed) = match message {
        MidiMessage::NoteOn { key, vel } => (key, vel.as_int() > 0),
        MidiMessage::NoteOff { key, .. } => (key, false),
        _ => return None,
    };
    let pad = notes::pad_for_note(key.as_int())?.get();
    Some(if pressed {
        Event::Press(pad)
    } else {
        Event::Release(pad)
    })
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        let (midi_events_tx, mut midi_events_rx) = mpsc::channel::<Vec<u8>>(64);
        let device = self.midi_device.clone();
        let channel = self.channel;

        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "MIDI driver");
            let _enter = span.enter();

            info!(device = device.name(), channel, "MIDI driver started.");

            if let Err(e) = device.watch_events(midi_events_tx) {
                error!(err = e.to_string(), "Error watching MIDI events");
            }
        });

        let device = self.midi_device.clone();
        tokio::spawn(async move {
            loop {
                let raw_event = match midi_events_rx.recv().await {
                    Some(raw_event) => raw_event,
                    None => {
                        info!("MIDI watcher closed.");
                        device.stop_watch_events();
                        return Ok(());
                    }
                };

                let Some(event) = to_event(&raw_event, channel) else {
                    debug!(raw_event = ?raw_event, "Ignoring MIDI event.");
                    continue;
                };

                if events_tx.send(event).await.is_err() {
                    info!("Controller closed, no longer watching MIDI.");
                    device.stop_watch_events();
                    return Ok(());
                }
            }
        })
    }
}

#[cfg(test)]
mod test {
    use std::{error::Error, sync::Arc};

    use midly::{live::LiveEvent, MidiMessage};

    use super::{to_event, Event};
    use crate::{
        audio::mock,
        controller::Controller,
        engine::{TriggerEngine, TriggerSettings},
        midi::{self, Device as _},
        notes::PadIndex,
        samples::{MapResolver, SampleLibrary},
        testutil::eventually,
    };

    fn note_on(channel: u8, key: u8, vel: u8) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8);
        LiveEvent::Midi {
            channel: channel.into(),
            message: MidiMessage::NoteOn {
                key: key.into(),
                vel: vel.into(),
            },
        }
        .write(&mut buf)
        .unwrap();
        buf
    }

    fn note_off(channel: u8, key: u8) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8);
        LiveEvent::Midi {
            channel: channel.into(),
            message: MidiMessage::NoteOff {
                key: key.into(),
                vel: 0.into(),
            },
        }
        .write(&mut buf)
        .unwrap();
        buf
    }

    #[test]
    fn test_to_event() {
        // Channels on the wire are 0-indexed, channel 10 is 9.
        assert_eq!(to_event(&note_on(9, 36, 100), None), Some(Event::Press(0)));
        assert_eq!(to_event(&note_on(9, 51, 1), Some(10)), Some(Event::Press(15)));
        assert_eq!(to_event(&note_on(9, 36, 0), None), Some(Event::Release(0)));
        assert_eq!(to_event(&note_off(0, 40), None), Some(Event::Release(4)));

        // Wrong channel, unmapped notes, other messages and junk.
        assert_eq!(to_event(&note_on(0, 36, 100), Some(10)), None);
        assert_eq!(to_event(&note_on(9, 35, 100), None), None);
        assert_eq!(to_event(&note_on(9, 52, 100), None), None);
        let mut program_change = Vec::new();
        LiveEvent::Midi {
            channel: 9.into(),
            message: MidiMessage::ProgramChange { program: 27.into() },
        }
        .write(&mut program_change)
        .unwrap();
        assert_eq!(to_event(&program_change, None), None);
        assert_eq!(to_event(&[1, 2, 3, 4, 5, 6, 7, 8], None), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_midi_controller() -> Result<(), Box<dyn Error>> {
        let output = Arc::new(mock::Output::get("mock"));
        let engine = Arc::new(TriggerEngine::new(
            SampleLibrary::load_all(&MapResolver::full_kit()),
            output.clone(),
            TriggerSettings::default(),
        )?);
        let midi_device = midi::test::Device::get("mock-midi-device");
        let driver = super::Driver::from_device(Arc::new(midi_device.clone()), Some(10));
        let mut controller = Controller::new(engine.clone(), driver);

        eventually(|| midi_device.is_watching(), "MIDI device never watched");

        let kick = PadIndex::new(0)?;
        let snare = PadIndex::new(1)?;

        // Ignored: wrong channel, then junk.
        midi_device.mock_event(&note_on(0, 37, 100));
        midi_device.mock_event(&[1, 2, 3, 4, 5, 6, 7, 8]);
        midi_device.mock_event(&note_on(9, 36, 100));
        eventually(|| engine.is_sounding(kick), "Kick never sounded");
        assert!(!engine.is_sounding(snare));

        midi_device.mock_event(&note_off(9, 36));
        eventually(|| !engine.is_sounding(kick), "Kick never stopped");

        midi_device.mock_event(&note_on(9, 37, 64));
        eventually(|| engine.is_sounding(snare), "Snare never sounded");
        midi_device.mock_event(&note_on(9, 37, 0));
        eventually(|| !engine.is_sounding(snare), "Snare never stopped");

        // Closing the device ends the controller.
        midi_device.stop_watch_events();
        controller.join().await?;

        assert_eq!(output.starts().len(), 2);
        assert_eq!(output.stops().len(), 2);
        Ok(())
    }
}
