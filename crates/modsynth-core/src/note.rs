//! Note-name parsing for sequencers.
//!
//! Notes are written `name_octave`, e.g. `a_4`, `c#_5`, `bb_3`. Names are
//! counted in semitones from A, so every octave runs A..G#:
//!
//! | Semitone | Names |
//! |----------|-------|
//! | 0 | `a` |
//! | 1 | `a#`, `bb` |
//! | 2 | `b`, `cb` |
//! | 3 | `c`, `b#` |
//! | 4 | `c#`, `db` |
//! | 5 | `d` |
//! | 6 | `d#`, `eb` |
//! | 7 | `e`, `fb` |
//! | 8 | `f`, `e#` |
//! | 9 | `f#`, `gb` |
//! | 10 | `g` |
//! | 11 | `g#`, `ab` |
//!
//! The frequency of a note is
//!
//! ```text
//! freq = pitch * 2^((semitone + transpose) / 12 + (octave - 4))
//! ```

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::string::{String, ToString};
use libm::powf;

/// Lowest accepted octave.
pub const MIN_OCTAVE: i32 = 0;
/// Highest accepted octave.
pub const MAX_OCTAVE: i32 = 10;

/// Note-name parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteError {
    /// Not of the form `name_octave`, or the octave is not an integer.
    Malformed(String),
    /// Note letter/accidental not in the twelve-tone table.
    UnknownNote(String),
    /// Octave outside [`MIN_OCTAVE`, `MAX_OCTAVE`].
    OctaveOutOfRange(i32),
}

#[cfg(feature = "std")]
impl std::fmt::Display for NoteError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Malformed(s) => write!(f, "malformed note '{s}', expected name_octave"),
            Self::UnknownNote(s) => write!(f, "unknown note name '{s}'"),
            Self::OctaveOutOfRange(o) => {
                write!(f, "octave {o} out of range [{MIN_OCTAVE}, {MAX_OCTAVE}]")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for NoteError {}

/// A parsed note: semitones above A plus octave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    /// Semitones above A, 0..12
    pub semitone: u8,
    /// Octave, `MIN_OCTAVE..=MAX_OCTAVE`
    pub octave: i32,
}

impl Note {
    /// Frequency at reference `pitch` (A4) shifted by `transpose` semitones.
    pub fn frequency(&self, pitch: f32, transpose: f32) -> f32 {
        let exponent = (f32::from(self.semitone) + transpose) / 12.0 + (self.octave - 4) as f32;
        pitch * powf(2.0, exponent)
    }
}

fn semitone(name: &str) -> Option<u8> {
    let s = match name {
        "a" => 0,
        "a#" | "bb" => 1,
        "b" | "cb" => 2,
        "c" | "b#" => 3,
        "c#" | "db" => 4,
        "d" => 5,
        "d#" | "eb" => 6,
        "e" | "fb" => 7,
        "f" | "e#" => 8,
        "f#" | "gb" => 9,
        "g" => 10,
        "g#" | "ab" => 11,
        _ => return None,
    };
    Some(s)
}

/// Parse `name_octave` (case-insensitive).
///
/// ```rust
/// use modsynth_core::{Note, parse_note};
///
/// assert_eq!(parse_note("c#_5"), Ok(Note { semitone: 4, octave: 5 }));
/// assert!(parse_note("h_4").is_err());
/// ```
pub fn parse_note(text: &str) -> Result<Note, NoteError> {
    let lower = text.trim().to_ascii_lowercase();
    let (name, octave) = lower
        .split_once('_')
        .ok_or_else(|| NoteError::Malformed(text.to_string()))?;
    let semitone = semitone(name).ok_or_else(|| NoteError::UnknownNote(name.to_string()))?;
    let octave: i32 = octave
        .parse()
        .map_err(|_| NoteError::Malformed(text.to_string()))?;
    if !(MIN_OCTAVE..=MAX_OCTAVE).contains(&octave) {
        return Err(NoteError::OctaveOutOfRange(octave));
    }
    Ok(Note { semitone, octave })
}

/// Parse a note name and return its frequency.
///
/// ```rust
/// use modsynth_core::note_to_freq;
///
/// assert_eq!(note_to_freq("a_4", 440.0, 0.0), Ok(440.0));
/// assert_eq!(note_to_freq("a_5", 440.0, 0.0), Ok(880.0));
/// assert!(note_to_freq("a_11", 440.0, 0.0).is_err());
/// ```
pub fn note_to_freq(text: &str, pitch: f32, transpose: f32) -> Result<f32, NoteError> {
    parse_note(text).map(|note| note.frequency(pitch, transpose))
}
