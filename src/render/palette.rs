use std::collections::BTreeMap;

use once_cell::sync::OnceCell;
use plotters::style::RGBColor;

use crate::engine::phasor::{PhaseSet, SegmentSource};
use crate::engine::EngineError;
use crate::types::{ColorKey, MAX_HARMONIC_ORDER};

const HARMONIC_HEX: [&str; MAX_HARMONIC_ORDER as usize] = [
    "#55FF55", "#FF55FF", "#FFFF55", "#00FFFF", "#FF5555", "#FFA500", "#800080", "#008000",
    "#0000FF", "#FFC0CB", "#A52A2A", "#808080", "#FFFFFF",
];
const NEGATIVE_FUNDAMENTAL_HEX: &str = "#FF55FF";

pub const BACKGROUND: RGBColor = RGBColor(0x1e, 0x1e, 0x1e);
pub const FALLBACK: RGBColor = RGBColor(0xff, 0xff, 0xff);
pub const POSITIVE_SET: [RGBColor; 3] = [
    RGBColor(0xff, 0x55, 0x55),
    RGBColor(0x55, 0xff, 0x55),
    RGBColor(0x55, 0x55, 0xff),
];
pub const NEGATIVE_SET: [RGBColor; 3] = [
    RGBColor(0xff, 0x55, 0xff),
    RGBColor(0x55, 0xff, 0xff),
    RGBColor(0xff, 0xff, 0x55),
];
pub const ALPHA: RGBColor = RGBColor(0xff, 0xa5, 0x00);
pub const BETA: RGBColor = RGBColor(0x00, 0xff, 0xff);
pub const RESULTANT_POSITIVE: RGBColor = RGBColor(0xff, 0xff, 0xff);
pub const RESULTANT_NEGATIVE: RGBColor = RGBColor(0xaa, 0xaa, 0xaa);

fn defaults() -> &'static BTreeMap<ColorKey, RGBColor> {
    static DEFAULTS: OnceCell<BTreeMap<ColorKey, RGBColor>> = OnceCell::new();
    DEFAULTS.get_or_init(|| {
        let mut map: BTreeMap<ColorKey, RGBColor> = HARMONIC_HEX
            .iter()
            .enumerate()
            .filter_map(|(slot, hex)| {
                let order = slot as u8 + 1;
                let key = if order == 1 {
                    ColorKey::FundamentalPositive
                } else {
                    ColorKey::Harmonic(order)
                };
                parse_hex(hex).ok().map(|color| (key, color))
            })
            .collect();
        if let Ok(color) = parse_hex(NEGATIVE_FUNDAMENTAL_HEX) {
            map.insert(ColorKey::FundamentalNegative, color);
        }
        map
    })
}

/// `#RRGGBB` (leading `#` optional).
pub fn parse_hex(hex: &str) -> Result<RGBColor, EngineError> {
    let invalid = || EngineError::InvalidSelector {
        kind: "color",
        value: hex.to_owned(),
    };
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 || !digits.is_ascii() {
        return Err(invalid());
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
    };
    Ok(RGBColor(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

pub fn to_hex(color: RGBColor) -> String {
    format!("#{:02X}{:02X}{:02X}", color.0, color.1, color.2)
}

/// Color lookup keyed by `ColorKey`, seeded with the default harmonic table.
#[derive(Clone, Debug)]
pub struct HarmonicPalette {
    colors: BTreeMap<ColorKey, RGBColor>,
}
impl Default for HarmonicPalette {
    fn default() -> Self {
        Self {
            colors: defaults().clone(),
        }
    }
}
impl HarmonicPalette {
    /// Unknown keys render white.
    pub fn get(&self, key: ColorKey) -> RGBColor {
        self.colors.get(&key).copied().unwrap_or(FALLBACK)
    }
    pub fn set(&mut self, key: ColorKey, color: RGBColor) {
        self.colors.insert(key, color);
    }
    pub fn set_hex(&mut self, key: ColorKey, hex: &str) -> Result<(), EngineError> {
        self.set(key, parse_hex(hex)?);
        Ok(())
    }
    pub fn segment_color(&self, source: &SegmentSource) -> RGBColor {
        match source {
            SegmentSource::Phase { phase, set } => match set {
                PhaseSet::Harmonics => POSITIVE_SET[phase.index()],
                PhaseSet::Negative => NEGATIVE_SET[phase.index()],
            },
            SegmentSource::Alpha => ALPHA,
            SegmentSource::Beta => BETA,
            SegmentSource::Rotating(component) => self.get(component.color),
        }
    }
}
