//! Per-frame surveillance status shown by the front-ends.
//!
//! Fire is the only implemented signal. Weapon detection and face recognition
//! are reported so the front-ends keep their layout, but they are always
//! inactive.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Fire,
    Weapon,
    Face,
}

impl Signal {
    pub fn label(&self) -> &'static str {
        match self {
            Signal::Fire => "Fire Detection",
            Signal::Weapon => "Weapon Detection",
            Signal::Face => "Face Recognition",
        }
    }

    /// Whether a detector exists behind this signal.
    pub fn is_implemented(&self) -> bool {
        matches!(self, Signal::Fire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignalStatus {
    pub signal: Signal,
    pub active: bool,
}

impl SignalStatus {
    pub fn inactive(signal: Signal) -> Self {
        Self {
            signal,
            active: false,
        }
    }
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.active { "ACTIVE" } else { "Inactive" };
        write!(f, "{}: {}", self.signal.label(), state)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SurveillanceStatus {
    pub fire: SignalStatus,
    pub weapon: SignalStatus,
    pub face: SignalStatus,
}

impl SurveillanceStatus {
    pub fn from_fire(active: bool) -> Self {
        Self {
            fire: SignalStatus {
                signal: Signal::Fire,
                active,
            },
            weapon: SignalStatus::inactive(Signal::Weapon),
            face: SignalStatus::inactive(Signal::Face),
        }
    }

    pub fn signals(&self) -> [SignalStatus; 3] {
        [self.fire, self.weapon, self.face]
    }

    pub fn any_active(&self) -> bool {
        self.signals().iter().any(|status| status.active)
    }
}

impl Default for SurveillanceStatus {
    fn default() -> Self {
        Self::from_fire(false)
    }
}

impl fmt::Display for SurveillanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} | {} | {}", self.fire, self.weapon, self.face)
    }
}
