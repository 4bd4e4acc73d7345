use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// The lowest value a client dial can express; every field of
/// [`Feel::default`] starts here.
pub const DEFAULT_DIAL: f64 = 0.02;

/// One of the four dimensions of a [`Feel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dial {
    Dance,
    Lyrics,
    Energy,
    Valence,
}

impl Dial {
    /// All dials, in display order.
    pub const ALL: [Self; 4] = [Self::Dance, Self::Lyrics, Self::Energy, Self::Valence];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dance => "dance",
            Self::Lyrics => "lyrics",
            Self::Energy => "energy",
            Self::Valence => "valence",
        }
    }
}

impl fmt::Display for Dial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The "feel" of a track: four audio descriptors, each nominally in `[0, 1]`.
///
/// A `Feel` can only be built through [`Feel::new`] (or deserialization,
/// which goes through the same check), so a value in hand never has a
/// negative or non-finite component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "FeelFields")]
pub struct Feel {
    energy: f64,
    lyrics: f64,
    dance: f64,
    valence: f64,
}

/// Unvalidated wire shape of a [`Feel`].
#[derive(Debug, Deserialize)]
struct FeelFields {
    energy: f64,
    lyrics: f64,
    dance: f64,
    valence: f64,
}

impl TryFrom<FeelFields> for Feel {
    type Error = Error;

    fn try_from(raw: FeelFields) -> Result<Self> {
        Self::new(raw.energy, raw.lyrics, raw.dance, raw.valence)
    }
}

impl Feel {
    /// Build a validated feel.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFeel`] naming the first field that is negative,
    /// infinite or NaN.
    pub fn new(energy: f64, lyrics: f64, dance: f64, valence: f64) -> Result<Self> {
        check("energy", energy)?;
        check("lyrics", lyrics)?;
        check("dance", dance)?;
        check("valence", valence)?;
        Ok(Self {
            energy,
            lyrics,
            dance,
            valence,
        })
    }

    #[must_use]
    pub const fn energy(&self) -> f64 {
        self.energy
    }

    /// Speech-likeness of the track.
    #[must_use]
    pub const fn lyrics(&self) -> f64 {
        self.lyrics
    }

    #[must_use]
    pub const fn dance(&self) -> f64 {
        self.dance
    }

    #[must_use]
    pub const fn valence(&self) -> f64 {
        self.valence
    }

    #[must_use]
    pub const fn get(&self, dial: Dial) -> f64 {
        match dial {
            Dial::Dance => self.dance,
            Dial::Lyrics => self.lyrics,
            Dial::Energy => self.energy,
            Dial::Valence => self.valence,
        }
    }

    /// Squared Euclidean distance between two feels.
    #[must_use]
    pub fn squared_distance(&self, other: &Self) -> f64 {
        Dial::ALL
            .iter()
            .map(|&dial| {
                let d = self.get(dial) - other.get(dial);
                d * d
            })
            .sum()
    }
}

impl Default for Feel {
    fn default() -> Self {
        Self {
            energy: DEFAULT_DIAL,
            lyrics: DEFAULT_DIAL,
            dance: DEFAULT_DIAL,
            valence: DEFAULT_DIAL,
        }
    }
}

fn check(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidFeel { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feel_new_accepts_non_negative() {
        let feel = Feel::new(0.0, 0.5, 1.0, 0.25).unwrap();
        assert_eq!(feel.energy(), 0.0);
        assert_eq!(feel.lyrics(), 0.5);
        assert_eq!(feel.dance(), 1.0);
        assert_eq!(feel.valence(), 0.25);
    }

    #[test]
    fn test_feel_new_rejects_each_negative_field() {
        let cases = [
            (Feel::new(-0.1, 0.0, 0.0, 0.0), "energy"),
            (Feel::new(0.0, -0.1, 0.0, 0.0), "lyrics"),
            (Feel::new(0.0, 0.0, -0.1, 0.0), "dance"),
            (Feel::new(0.0, 0.0, 0.0, -0.1), "valence"),
        ];
        for (result, expected) in cases {
            match result {
                Err(Error::InvalidFeel { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected InvalidFeel for {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_feel_new_rejects_nan() {
        assert!(Feel::new(f64::NAN, 0.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_feel_new_rejects_infinity() {
        assert!(Feel::new(f64::INFINITY, 0.0, 0.0, 0.0).is_err());
        assert!(Feel::new(0.0, 0.0, 0.0, f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_feel_above_one_is_accepted() {
        assert!(Feel::new(1.5, 0.0, 0.0, 0.0).is_ok());
    }

    #[test]
    fn test_default_feel() {
        let feel = Feel::default();
        for dial in Dial::ALL {
            assert_eq!(feel.get(dial), DEFAULT_DIAL);
        }
    }

    #[test]
    fn test_squared_distance() {
        let a = Feel::new(0.5, 0.1, 0.5, 0.5).unwrap();
        let c = Feel::new(0.4, 0.2, 0.4, 0.6).unwrap();
        assert_eq!(a.squared_distance(&a), 0.0);
        assert!((a.squared_distance(&c) - 0.04).abs() < 1e-9);
        assert!((c.squared_distance(&a) - a.squared_distance(&c)).abs() < 1e-12);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Feel =
            serde_json::from_str(r#"{"energy":0.1,"lyrics":0.2,"dance":0.3,"valence":0.4}"#)
                .unwrap();
        assert_eq!(ok.dance(), 0.3);

        let bad = serde_json::from_str::<Feel>(
            r#"{"energy":0.1,"lyrics":-0.2,"dance":0.3,"valence":0.4}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_dial_names() {
        let names: Vec<&str> = Dial::ALL.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["dance", "lyrics", "energy", "valence"]);
        assert_eq!(Dial::Energy.to_string(), "energy");
    }
}
