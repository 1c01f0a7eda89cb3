use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Named sequential colour scale
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Palette {
    #[default]
    Viridis,
    Inferno,
    YlGnBu,
    Cividis,
}

const VIRIDIS: &[(u8, u8, u8)] = &[
    (68, 1, 84),
    (72, 40, 120),
    (62, 73, 137),
    (49, 104, 142),
    (38, 130, 142),
    (31, 158, 137),
    (53, 183, 121),
    (110, 206, 88),
    (181, 222, 43),
    (253, 231, 37),
];

const INFERNO: &[(u8, u8, u8)] = &[
    (0, 0, 4),
    (27, 12, 65),
    (74, 12, 107),
    (120, 28, 109),
    (165, 44, 96),
    (207, 68, 70),
    (237, 105, 37),
    (251, 155, 6),
    (247, 209, 61),
    (252, 255, 164),
];

const YLGNBU: &[(u8, u8, u8)] = &[
    (255, 255, 217),
    (237, 248, 177),
    (199, 233, 180),
    (127, 205, 187),
    (65, 182, 196),
    (29, 145, 192),
    (34, 94, 168),
    (37, 52, 148),
    (8, 29, 88),
];

const CIVIDIS: &[(u8, u8, u8)] = &[
    (0, 32, 76),
    (0, 42, 102),
    (0, 52, 110),
    (39, 63, 108),
    (60, 74, 107),
    (76, 85, 107),
    (91, 95, 109),
    (104, 106, 112),
    (117, 117, 117),
    (131, 129, 120),
    (146, 140, 120),
    (161, 152, 118),
    (176, 165, 114),
    (192, 177, 109),
    (209, 191, 102),
    (225, 204, 92),
    (243, 219, 79),
    (255, 233, 69),
];

impl Palette {
    pub const ALL: [Palette; 4] = [
        Palette::Viridis,
        Palette::Inferno,
        Palette::YlGnBu,
        Palette::Cividis,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Palette::Viridis => "Viridis",
            Palette::Inferno => "Inferno",
            Palette::YlGnBu => "YlGnBu",
            Palette::Cividis => "Cividis",
        }
    }

    /// Case-insensitive lookup; unknown names fall back to Viridis
    pub fn from_name(name: &str) -> Self {
        let wanted = name.trim();
        match Self::ALL
            .into_iter()
            .find(|palette| palette.name().eq_ignore_ascii_case(wanted))
        {
            Some(palette) => palette,
            None => {
                log::warn!("Unknown palette '{}', using Viridis", wanted);
                Palette::Viridis
            }
        }
    }

    fn stops(&self) -> &'static [(u8, u8, u8)] {
        match self {
            Palette::Viridis => VIRIDIS,
            Palette::Inferno => INFERNO,
            Palette::YlGnBu => YLGNBU,
            Palette::Cividis => CIVIDIS,
        }
    }

    /// Colour at position `t` in `[0, 1]`, linearly interpolated between stops
    pub fn sample(&self, t: f64) -> Rgb {
        let stops = self.stops();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        let scaled = t * (stops.len() - 1) as f64;
        let lower = (scaled.floor() as usize).min(stops.len() - 1);
        let upper = (lower + 1).min(stops.len() - 1);
        let frac = scaled - lower as f64;

        let (r0, g0, b0) = stops[lower];
        let (r1, g1, b1) = stops[upper];
        Rgb {
            r: lerp(r0, r1, frac),
            g: lerp(g0, g1, frac),
            b: lerp(b0, b1, frac),
        }
    }
}

fn lerp(a: u8, b: u8, frac: f64) -> u8 {
    let value = a as f64 + (b as f64 - a as f64) * frac;
    value.round().clamp(0.0, 255.0) as u8
}

impl fmt::Display for Palette {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<String> for Palette {
    fn from(name: String) -> Self {
        Palette::from_name(&name)
    }
}

impl From<Palette> for String {
    fn from(palette: Palette) -> Self {
        palette.name().to_string()
    }
}

/// sRGB colour, serialized as `rgb(r, g, b)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_hit_first_and_last_stop() {
        assert_eq!(Palette::Viridis.sample(0.0), Rgb { r: 68, g: 1, b: 84 });
        assert_eq!(Palette::Viridis.sample(1.0), Rgb { r: 253, g: 231, b: 37 });
        assert_eq!(Palette::YlGnBu.sample(1.0), Rgb { r: 8, g: 29, b: 88 });
        assert_eq!(Palette::Cividis.sample(5.0), Palette::Cividis.sample(1.0));
        assert_eq!(Palette::Inferno.sample(f64::NAN), Rgb { r: 0, g: 0, b: 4 });
    }

    #[test]
    fn interpolates_between_stops() {
        // 9 stops: t = 1/16 sits halfway between the first two
        let mid = Palette::YlGnBu.sample(1.0 / 16.0);
        assert_eq!(mid, Rgb { r: 246, g: 252, b: 197 });
    }

    #[test]
    fn unknown_names_fall_back_to_viridis() {
        assert_eq!(Palette::from_name("inferno"), Palette::Inferno);
        assert_eq!(Palette::from_name(" YLGNBU "), Palette::YlGnBu);
        assert_eq!(Palette::from_name("Rainbow"), Palette::Viridis);
    }

    #[test]
    fn serializes_by_name() {
        let json = serde_json::to_string(&Palette::Cividis).unwrap();
        assert_eq!(json, "\"Cividis\"");
        let parsed: Palette = serde_json::from_str("\"magma\"").unwrap();
        assert_eq!(parsed, Palette::Viridis);
        assert_eq!(
            serde_json::to_string(&Rgb { r: 1, g: 2, b: 3 }).unwrap(),
            "\"rgb(1, 2, 3)\""
        );
    }
}
