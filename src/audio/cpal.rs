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
use std::{error::Error, fmt, thread};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::{error, info, span, warn, Level};

use super::mixer::{AudioMixer, Command, MixerVoice};
use super::thread_priority::{
    callback_thread_priority, configure_audio_thread_priority, rt_audio_enabled,
};
use crate::config;
use crate::samples::{PcmBuffer, SampleLibrary};

/// The device name that selects the host's default output.
const DEFAULT_DEVICE: &str = "default";

/// Commands that may be waiting for the callback. A healthy callback drains the
/// queue every block, so filling it means the stream has stalled.
const COMMAND_QUEUE_SIZE: usize = 1024;

/// Plays voices through a cpal output device.
///
/// Voices are mixed directly in the cpal callback. Trigger calls only push a
/// command onto a channel that the callback drains at the start of every
/// block, so the trigger latency is bounded by the stream buffer size.
pub struct Output {
    /// Audio configuration.
    config: config::Audio,
    /// Channel for handing voice commands to the audio callback.
    commands_tx: Sender<Command>,
    /// The receiving end, moved into the callback on attach. Once the stream
    /// goes away so does the only receiver, and sends start failing.
    commands_rx: Mutex<Option<Receiver<Command>>>,
    /// The running stream, once attached.
    stream: Mutex<Option<StreamHandle>>,
}

/// Keeps the stream thread alive. cpal streams aren't Send on every platform,
/// so the stream lives on its own thread until this handle is dropped.
struct StreamHandle {
    device_name: String,
    shutdown_tx: Sender<()>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!(device = self.device_name, "Audio output thread panicked");
            }
        }
    }
}

impl Output {
    /// Creates an unattached output for the given configuration.
    pub fn new(config: config::Audio) -> Output {
        let (commands_tx, commands_rx) = crossbeam_channel::bounded(COMMAND_QUEUE_SIZE);
        Output {
            config,
            commands_tx,
            commands_rx: Mutex::new(Some(commands_rx)),
            stream: Mutex::new(None),
        }
    }

    /// Lists cpal output devices.
    pub fn list() -> Result<Vec<String>, Box<dyn Error>> {
        // Suppress noisy output here.
        let _shh_stdout = shh::stdout()?;
        let _shh_stderr = shh::stderr()?;

        let mut devices: Vec<String> = Vec::new();
        for host_id in cpal::available_hosts() {
            let host_devices = match cpal::host_from_id(host_id)?.output_devices() {
                Ok(host_devices) => host_devices,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        host = host_id.name(),
                        "Unable to list devices for host"
                    );
                    continue;
                }
            };

            for device in host_devices {
                let channels = match device.default_output_config() {
                    Ok(output_config) => output_config.channels(),
                    Err(_) => continue,
                };
                devices.push(format!(
                    "{} (Channels={}) ({})",
                    device.name()?,
                    channels,
                    host_id.name()
                ));
            }
        }

        devices.sort();
        Ok(devices)
    }

    /// Hands a command to the audio callback without blocking.
    fn send(&self, command: Command) -> Result<(), Box<dyn Error>> {
        if self.commands_rx.lock().is_some() {
            return Err("audio output is not attached".into());
        }
        self.commands_tx.try_send(command).map_err(|e| match e {
            TrySendError::Full(_) => "audio output is not keeping up, command dropped".into(),
            TrySendError::Disconnected(_) => "audio output is not running".into(),
        })
    }

    /// Finds the cpal device with the given name.
    fn find_device(name: &str) -> Result<cpal::Device, Box<dyn Error>> {
        let _shh_stdout = shh::stdout()?;
        let _shh_stderr = shh::stderr()?;

        if name == DEFAULT_DEVICE {
            return cpal::default_host()
                .default_output_device()
                .ok_or_else(|| "no default output device".into());
        }

        for host_id in cpal::available_hosts() {
            let Ok(devices) = cpal::host_from_id(host_id)?.output_devices() else {
                continue;
            };
            for device in devices {
                if device.name().is_ok_and(|n| n.trim() == name) {
                    return Ok(device);
                }
            }
        }

        Err(format!("no device found with name {}", name).into())
    }
}

/// Builds the output stream for the device's native sample format.
fn build_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sample_format: cpal::SampleFormat,
    commands_rx: Receiver<Command>,
) -> Result<cpal::Stream, String> {
    match sample_format {
        cpal::SampleFormat::F32 => build_typed_stream::<f32>(device, config, commands_rx),
        cpal::SampleFormat::I16 => build_typed_stream::<i16>(device, config, commands_rx),
        cpal::SampleFormat::I32 => build_typed_stream::<i32>(device, config, commands_rx),
        cpal::SampleFormat::U16 => build_typed_stream::<u16>(device, config, commands_rx),
        other => Err(format!("unsupported sample format {:?}", other)),
    }
}

fn build_typed_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    commands_rx: Receiver<Command>,
) -> Result<cpal::Stream, String>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let mut mixer = AudioMixer::new(config.channels);
    // Grows to the callback's block size once, then gets reused.
    let mut scratch: Vec<f32> = Vec::with_capacity(4096);
    let priority = callback_thread_priority();
    let rt_audio = rt_audio_enabled();
    let mut priority_set = false;

    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                configure_audio_thread_priority(priority, rt_audio, &mut priority_set);

                while let Ok(command) = commands_rx.try_recv() {
                    mixer.apply(command);
                }

                scratch.resize(data.len(), 0.0);
                mixer.process_into_output(&mut scratch);
                for (dst, &src) in data.iter_mut().zip(scratch.iter()) {
                    *dst = T::from_sample(src);
                }
            },
            |err| error!(err = %err, "Audio output stream error"),
            None,
        )
        .map_err(|e| e.to_string())
}

impl super::Output for Output {
    fn attach(&self, library: &SampleLibrary) -> Result<(), Box<dyn Error>> {
        let span = span!(Level::INFO, "attach (cpal)");
        let _enter = span.enter();

        let mut stream = self.stream.lock();
        if stream.is_some() {
            return Err("audio output is already attached".into());
        }

        let sample_rate = self.config.sample_rate();
        for (pad, buffer) in library.iter() {
            if buffer.sample_rate() != sample_rate {
                warn!(
                    pad = pad.get(),
                    sample_rate = buffer.sample_rate(),
                    output_rate = sample_rate,
                    "Sample rate doesn't match the output, pad will play off pitch"
                );
            }
        }

        let device = Output::find_device(self.config.device())?;
        let device_name = device.name()?;
        let supported = device.default_output_config()?;
        let channels = supported.channels();
        let sample_format = supported.sample_format();
        let stream_config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: match self.config.buffer_size() {
                Some(frames) => cpal::BufferSize::Fixed(frames),
                None => cpal::BufferSize::Default,
            },
        };

        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<(), String>>(1);
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
        let Some(commands_rx) = self.commands_rx.lock().take() else {
            return Err("audio output failed to start and can't be reattached".into());
        };
        let thread = thread::spawn(move || {
            let started = build_stream(&device, &stream_config, sample_format, commands_rx)
                .and_then(|stream| stream.play().map(|_| stream).map_err(|e| e.to_string()));
            match started {
                Ok(stream) => {
                    let _ = ready_tx.send(Ok(()));
                    // Hold the stream until shutdown (or until the handle is gone).
                    let _ = shutdown_rx.recv();
                    drop(stream);
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                }
            }
        });

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(format!("failed to start output on {}: {}", device_name, e).into());
            }
            Err(_) => {
                return Err("audio output thread exited before the stream started".into());
            }
        }

        info!(
            device = device_name,
            channels,
            sample_rate,
            sample_format = ?sample_format,
            buffer_size = ?self.config.buffer_size(),
            "Audio output attached"
        );
        *stream = Some(StreamHandle {
            device_name,
            shutdown_tx,
            thread: Some(thread),
        });
        Ok(())
    }

    fn start_voice(
        &self,
        buffer: &PcmBuffer,
        note: u8,
        velocity: u8,
        channel: u8,
    ) -> Result<(), Box<dyn Error>> {
        self.send(Command::Start(MixerVoice::new(
            buffer.clone(),
            note,
            velocity,
            channel,
        )))
    }

    fn stop_voice(&self, note: u8, channel: u8) -> Result<(), Box<dyn Error>> {
        self.send(Command::Stop { note, channel })
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stream.lock().as_ref() {
            Some(stream) => write!(f, "{} (cpal)", stream.device_name),
            None => write!(f, "{} (cpal, detached)", self.config.device()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Output as _;

    fn click() -> PcmBuffer {
        PcmBuffer::new(vec![1.0; 4], 1, 44100)
    }

    /// Stands in for attach: takes the receiver the way the stream thread does.
    fn take_receiver(output: &Output) -> Receiver<Command> {
        output.commands_rx.lock().take().unwrap()
    }

    #[test]
    fn test_voices_before_attach_fail() {
        let output = Output::new(config::Audio::new("default"));
        assert!(output.start_voice(&click(), 36, 90, 10).is_err());
        assert!(output.stop_voice(36, 10).is_err());
    }

    #[test]
    fn test_voices_reach_the_stream() {
        let output = Output::new(config::Audio::new("default"));
        let commands_rx = take_receiver(&output);

        output.start_voice(&click(), 36, 90, 10).unwrap();
        output.stop_voice(36, 10).unwrap();

        let mut mixer = AudioMixer::new(1);
        let mut block = vec![0.0f32; 4];
        let first = commands_rx.try_recv().unwrap();
        mixer.apply(first);
        mixer.process_into_output(&mut block);
        assert!(block.iter().all(|s| *s > 0.0));
        assert!(matches!(
            commands_rx.try_recv(),
            Ok(Command::Stop {
                note: 36,
                channel: 10
            })
        ));
    }

    #[test]
    fn test_voices_fail_once_the_stream_is_gone() {
        let output = Output::new(config::Audio::new("default"));
        drop(take_receiver(&output));

        let err = output.start_voice(&click(), 36, 90, 10).unwrap_err();
        assert_eq!(err.to_string(), "audio output is not running");
        assert!(output.stop_voice(36, 10).is_err());
    }

    #[test]
    fn test_stalled_stream_reports_full_queue() {
        let output = Output::new(config::Audio::new("default"));
        let _commands_rx = take_receiver(&output);

        for _ in 0..COMMAND_QUEUE_SIZE {
            output.stop_voice(36, 10).unwrap();
        }
        let err = output.stop_voice(36, 10).unwrap_err();
        assert!(err.to_string().contains("not keeping up"));
    }
}
