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

//! Static mapping between pads, MIDI notes and display names.

use std::fmt;

/// The number of pads on the instrument.
pub const PAD_COUNT: usize = 16;

/// The note bound to pad 0. Pads map to consecutive notes from here.
pub const BASE_NOTE: u8 = 36;

const PITCH_CLASSES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

const DISPLAY_NAMES: [&str; PAD_COUNT] = [
    "KICK",
    "SNARE",
    "CLOSED HI-HAT",
    "OPEN HI-HAT",
    "RIM SHOT",
    "CRASH",
    "TOM I",
    "TOM II",
    "PAD I",
    "PAD II",
    "PAD III",
    "PAD IV",
    "PAD V",
    "PAD VI",
    "PAD VII",
    "PAD VIII",
];

/// Returned when a pad index falls outside of the pad grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid pad index {0}, expected 0..{PAD_COUNT}")]
pub struct InvalidPadIndex(pub usize);

/// A validated pad index in `0..PAD_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PadIndex(usize);

impl PadIndex {
    /// Validates the given index.
    pub fn new(index: usize) -> Result<PadIndex, InvalidPadIndex> {
        if index < PAD_COUNT {
            Ok(PadIndex(index))
        } else {
            Err(InvalidPadIndex(index))
        }
    }

    /// Iterates over every pad in index order.
    pub fn all() -> impl Iterator<Item = PadIndex> {
        (0..PAD_COUNT).map(PadIndex)
    }

    /// The raw index.
    pub fn get(self) -> usize {
        self.0
    }
}

impl TryFrom<usize> for PadIndex {
    type Error = InvalidPadIndex;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        PadIndex::new(index)
    }
}

impl fmt::Display for PadIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The note bound to the given pad.
pub fn note(pad: PadIndex) -> u8 {
    // PAD_COUNT is well below u8::MAX, so the cast can't truncate.
    BASE_NOTE + pad.0 as u8
}

/// The display name of the given pad.
pub fn display_name(pad: PadIndex) -> &'static str {
    DISPLAY_NAMES[pad.0]
}

/// Finds the pad bound to the given note, if any.
pub fn pad_for_note(note: u8) -> Option<PadIndex> {
    note.checked_sub(BASE_NOTE)
        .and_then(|offset| PadIndex::new(offset as usize).ok())
}

/// Names a pitch as pitch class plus octave, e.g. 36 is "C2".
///
/// The octave is `(pitch - 12) / 12` with integer division. Sample kits are
/// named after this convention, so it must not be "corrected" to the
/// scientific pitch octave.
pub fn pitch_name(pitch: u8) -> String {
    let octave = (i32::from(pitch) - 12) / 12;
    format!("{}{}", PITCH_CLASSES[usize::from(pitch % 12)], octave)
}

/// The note name of the given pad, e.g. "C2" for pad 0.
pub fn note_name(pad: PadIndex) -> String {
    pitch_name(note(pad))
}

/// The resource name for the sample bound to the given pad, e.g. "KICKC2".
pub fn resource_name(pad: PadIndex) -> String {
    format!("{}{}", display_name(pad), note_name(pad))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad(index: usize) -> PadIndex {
        PadIndex::new(index).unwrap()
    }

    #[test]
    fn test_pad_index_bounds() {
        assert!(PadIndex::new(0).is_ok());
        assert!(PadIndex::new(15).is_ok());
        assert_eq!(PadIndex::new(16), Err(InvalidPadIndex(16)));
        assert_eq!(PadIndex::all().count(), PAD_COUNT);
    }

    #[test]
    fn test_notes_are_consecutive_and_unique() {
        let notes: Vec<u8> = PadIndex::all().map(note).collect();
        assert_eq!(notes.first(), Some(&36));
        assert_eq!(notes.last(), Some(&51));
        assert!(notes.windows(2).all(|w| w[1] == w[0] + 1));
    }

    #[test]
    fn test_note_name_octave_arithmetic() {
        assert_eq!(note_name(pad(0)), "C2");
        assert_eq!(note_name(pad(1)), "C#2");
        assert_eq!(note_name(pad(11)), "B2");
        assert_eq!(note_name(pad(12)), "C3");
        assert_eq!(note_name(pad(15)), "D#3");
        assert_eq!(pitch_name(12), "C0");
        assert_eq!(pitch_name(0), "C-1");
    }

    #[test]
    fn test_resource_names() {
        assert_eq!(resource_name(pad(0)), "KICKC2");
        assert_eq!(resource_name(pad(2)), "CLOSED HI-HATD2");
        assert_eq!(resource_name(pad(15)), "PAD VIIID#3");
    }

    #[test]
    fn test_pad_for_note_round_trips() {
        for p in PadIndex::all() {
            assert_eq!(pad_for_note(note(p)), Some(p));
        }
        assert_eq!(pad_for_note(35), None);
        assert_eq!(pad_for_note(52), None);
        assert_eq!(pad_for_note(0), None);
    }
}
