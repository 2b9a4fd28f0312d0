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

// Voice mixing that's independent of any audio backend.
use crate::samples::PcmBuffer;

/// Commands sent from trigger callers to whoever owns the mixer.
pub enum Command {
    /// Start a voice.
    Start(MixerVoice),
    /// Stop any voice with this note and channel.
    Stop { note: u8, channel: u8 },
}

/// A voice being mixed.
pub struct MixerVoice {
    note: u8,
    channel: u8,
    buffer: PcmBuffer,
    /// Current position in frames.
    position: usize,
    gain: f32,
}

impl MixerVoice {
    /// Creates a voice at the start of its buffer. Velocity scales the gain linearly.
    pub fn new(buffer: PcmBuffer, note: u8, velocity: u8, channel: u8) -> MixerVoice {
        MixerVoice {
            note,
            channel,
            buffer,
            position: 0,
            gain: f32::from(velocity.min(127)) / 127.0,
        }
    }

    fn matches(&self, note: u8, channel: u8) -> bool {
        self.note == note && self.channel == channel
    }

    fn is_finished(&self) -> bool {
        self.position >= self.buffer.frames()
    }

    /// Adds up to `frames` frames of this voice into the interleaved output.
    /// Mono buffers feed every output channel; otherwise channels map 1:1 and
    /// extra source channels are dropped.
    fn mix_into(&mut self, output: &mut [f32], num_channels: usize, frames: usize) {
        let source_channels = self.buffer.channel_count() as usize;
        let samples = self.buffer.samples();
        let to_mix = frames.min(self.buffer.frames().saturating_sub(self.position));

        for frame in 0..to_mix {
            let source = &samples[(self.position + frame) * source_channels..][..source_channels];
            let out = &mut output[frame * num_channels..][..num_channels];
            if source_channels == 1 {
                for sample in out.iter_mut() {
                    *sample += source[0] * self.gain;
                }
            } else {
                for (sample, &s) in out.iter_mut().zip(source.iter()) {
                    *sample += s * self.gain;
                }
            }
        }
        self.position += to_mix;
    }
}

/// Mixes active voices into interleaved output blocks.
pub struct AudioMixer {
    voices: Vec<MixerVoice>,
    num_channels: u16,
}

impl AudioMixer {
    /// Creates a new audio mixer.
    pub fn new(num_channels: u16) -> Self {
        Self {
            voices: Vec::with_capacity(32),
            num_channels,
        }
    }

    /// Applies a command. Starting a voice that is already playing cuts the old one.
    pub fn apply(&mut self, command: Command) {
        match command {
            Command::Start(voice) => {
                self.voices.retain(|v| !v.matches(voice.note, voice.channel));
                self.voices.push(voice);
            }
            Command::Stop { note, channel } => {
                self.voices.retain(|v| !v.matches(note, channel));
            }
        }
    }

    /// Overwrites `output` with the next `output.len() / num_channels` frames
    /// of the mix. Voices that run out are dropped.
    pub fn process_into_output(&mut self, output: &mut [f32]) {
        output.fill(0.0);
        let num_channels = self.num_channels as usize;
        if num_channels == 0 {
            return;
        }
        let frames = output.len() / num_channels;

        for voice in self.voices.iter_mut() {
            voice.mix_into(output, num_channels, frames);
        }
        self.voices.retain(|v| !v.is_finished());
    }

    /// The number of voices still playing.
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voice(samples: Vec<f32>, channels: u16, note: u8, velocity: u8) -> MixerVoice {
        MixerVoice::new(PcmBuffer::new(samples, channels, 44100), note, velocity, 10)
    }

    #[test]
    fn test_mono_voice_feeds_all_channels() {
        let mut mixer = AudioMixer::new(2);
        mixer.apply(Command::Start(voice(vec![1.0, 0.5], 1, 36, 127)));

        let mut output = vec![9.0f32; 6];
        mixer.process_into_output(&mut output);
        assert_eq!(output, vec![1.0, 1.0, 0.5, 0.5, 0.0, 0.0]);
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn test_velocity_scales_gain() {
        let mut mixer = AudioMixer::new(1);
        mixer.apply(Command::Start(voice(vec![1.0; 4], 1, 36, 90)));

        let mut output = vec![0.0f32; 2];
        mixer.process_into_output(&mut output);
        assert!((output[0] - 90.0 / 127.0).abs() < 0.0001);
        assert_eq!(mixer.active_voices(), 1);
    }

    #[test]
    fn test_voices_sum_and_continue_across_blocks() {
        let mut mixer = AudioMixer::new(2);
        mixer.apply(Command::Start(voice(vec![0.25, -0.25, 0.25, -0.25], 2, 36, 127)));
        mixer.apply(Command::Start(voice(vec![0.5, 0.5, 0.5], 1, 38, 127)));

        let mut output = vec![0.0f32; 2];
        mixer.process_into_output(&mut output);
        assert_eq!(output, vec![0.75, 0.25]);

        mixer.process_into_output(&mut output);
        assert_eq!(output, vec![0.75, 0.25]);
        assert_eq!(mixer.active_voices(), 1);

        mixer.process_into_output(&mut output);
        assert_eq!(output, vec![0.5, 0.5]);
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn test_stop_removes_only_matching_voice() {
        let mut mixer = AudioMixer::new(1);
        mixer.apply(Command::Start(voice(vec![1.0; 64], 1, 36, 127)));
        mixer.apply(Command::Start(voice(vec![1.0; 64], 1, 37, 127)));

        mixer.apply(Command::Stop {
            note: 36,
            channel: 10,
        });
        assert_eq!(mixer.active_voices(), 1);

        // Wrong channel, nothing to stop.
        mixer.apply(Command::Stop {
            note: 37,
            channel: 1,
        });
        assert_eq!(mixer.active_voices(), 1);

        // Stopping twice is harmless.
        mixer.apply(Command::Stop {
            note: 36,
            channel: 10,
        });
        assert_eq!(mixer.active_voices(), 1);
    }

    #[test]
    fn test_restart_cuts_previous_voice() {
        let mut mixer = AudioMixer::new(1);
        mixer.apply(Command::Start(voice(vec![1.0; 64], 1, 36, 127)));
        mixer.apply(Command::Start(voice(vec![1.0; 64], 1, 36, 127)));
        assert_eq!(mixer.active_voices(), 1);
    }
}
