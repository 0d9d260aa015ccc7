//! Gaia photometric bands and per-band storage

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MagErrError;

/// One of the three Gaia photometric channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    /// Broad G band (primary)
    G,
    /// Blue photometer (secondary)
    Bp,
    /// Red photometer (tertiary)
    Rp,
}

impl Band {
    /// All bands in catalog order
    pub const ALL: [Band; 3] = [Band::G, Band::Bp, Band::Rp];

    /// Lowercase short name used in column labels (`g`, `bp`, `rp`)
    pub fn slug(&self) -> &'static str {
        match self {
            Band::G => "g",
            Band::Bp => "bp",
            Band::Rp => "rp",
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Band::G => write!(f, "G"),
            Band::Bp => write!(f, "BP"),
            Band::Rp => write!(f, "RP"),
        }
    }
}

impl FromStr for Band {
    type Err = MagErrError;

    /// Parse a band name, case-insensitively.
    ///
    /// Accepts the survey names (`g`, `bp`, `rp`) and the role names
    /// (`primary`, `secondary`, `tertiary`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "g" | "primary" => Ok(Band::G),
            "bp" | "secondary" => Ok(Band::Bp),
            "rp" | "tertiary" => Ok(Band::Rp),
            _ => Err(MagErrError::invalid(format!("Unknown band: {s}"))),
        }
    }
}

/// One value per band.
///
/// Fixed-size replacement for string-keyed band dictionaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerBand<T> {
    pub g: T,
    pub bp: T,
    pub rp: T,
}

impl<T> PerBand<T> {
    pub fn new(g: T, bp: T, rp: T) -> Self {
        Self { g, bp, rp }
    }

    /// Build a value per band from a closure
    pub fn from_fn<F: FnMut(Band) -> T>(mut f: F) -> Self {
        Self {
            g: f(Band::G),
            bp: f(Band::Bp),
            rp: f(Band::Rp),
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, mut f: F) -> PerBand<U> {
        PerBand {
            g: f(self.g),
            bp: f(self.bp),
            rp: f(self.rp),
        }
    }

    /// Fallible per-band map, stopping at the first error in band order
    pub fn try_map<U, E, F: FnMut(Band, T) -> Result<U, E>>(
        self,
        mut f: F,
    ) -> Result<PerBand<U>, E> {
        Ok(PerBand {
            g: f(Band::G, self.g)?,
            bp: f(Band::Bp, self.bp)?,
            rp: f(Band::Rp, self.rp)?,
        })
    }

    /// Iterate `(band, value)` pairs in band order
    pub fn iter(&self) -> impl Iterator<Item = (Band, &T)> + '_ {
        Band::ALL.into_iter().map(move |band| (band, &self[band]))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.iter().map(|(_, value)| value)
    }
}

impl<T> Index<Band> for PerBand<T> {
    type Output = T;

    fn index(&self, band: Band) -> &T {
        match band {
            Band::G => &self.g,
            Band::Bp => &self.bp,
            Band::Rp => &self.rp,
        }
    }
}

impl<T> IndexMut<Band> for PerBand<T> {
    fn index_mut(&mut self, band: Band) -> &mut T {
        match band {
            Band::G => &mut self.g,
            Band::Bp => &mut self.bp,
            Band::Rp => &mut self.rp,
        }
    }
}
