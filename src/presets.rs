use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::engine::{EngineError, HarmonicSpec};
use crate::types::normalize_selector;

/// Named harmonic mixes whose rotation chains trace recognizable curves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Preset {
    PureSine,
    WindBlades,
    OakTree,
    Gear,
    Hypotrochoid,
}
impl Preset {
    pub const ALL: [Preset; 5] = [
        Preset::PureSine,
        Preset::WindBlades,
        Preset::OakTree,
        Preset::Gear,
        Preset::Hypotrochoid,
    ];
    pub fn name(self) -> &'static str {
        match self {
            Preset::PureSine => "pure-sine",
            Preset::WindBlades => "wind-blades",
            Preset::OakTree => "oak-tree",
            Preset::Gear => "gear",
            Preset::Hypotrochoid => "hypotrochoid",
        }
    }
    fn harmonics(self) -> &'static [(u8, f64)] {
        match self {
            Preset::PureSine => &[(1, 1.0)],
            Preset::WindBlades => &[(1, 1.0), (2, 0.5), (4, 0.4), (5, 0.2), (7, 0.2), (8, 0.1)],
            Preset::OakTree => &[(1, 1.0), (2, 0.3), (4, 0.2), (11, 0.1), (13, 0.1)],
            Preset::Gear => &[(1, 1.0), (11, 0.1), (13, 0.1)],
            Preset::Hypotrochoid => &[(1, 1.0), (8, 0.5)],
        }
    }
    /// Fresh harmonic mix for this preset; the negative fundamental is always cleared.
    pub fn spec(self) -> Result<HarmonicSpec, EngineError> {
        HarmonicSpec::new(self.harmonics().iter().copied(), 0.0)
    }
}
impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
impl FromStr for Preset {
    type Err = EngineError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_selector(s);
        Preset::ALL
            .into_iter()
            .find(|preset| normalize_selector(preset.name()) == wanted)
            .ok_or_else(|| EngineError::InvalidSelector {
                kind: "preset",
                value: s.to_owned(),
            })
    }
}
