use std::str::FromStr;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

const NAMED_COLORS: &[(&str, (u8, u8, u8))] = &[
    ("black", (0, 0, 0)),
    ("white", (255, 255, 255)),
    ("red", (255, 0, 0)),
    ("green", (0, 128, 0)),
    ("blue", (0, 0, 255)),
    ("yellow", (255, 255, 0)),
    ("orange", (255, 165, 0)),
    ("purple", (128, 0, 128)),
    ("brown", (165, 42, 42)),
    ("pink", (255, 192, 203)),
    ("cyan", (0, 255, 255)),
    ("magenta", (255, 0, 255)),
    ("grey", (128, 128, 128)),
    ("gray", (128, 128, 128)),
    ("lightgrey", (211, 211, 211)),
    ("lightgray", (211, 211, 211)),
    ("darkgrey", (169, 169, 169)),
    ("darkgray", (169, 169, 169)),
];

impl Rgb {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        Rgb {
            r: self.r + t * (other.r - self.r),
            g: self.g + t * (other.g - self.g),
            b: self.b + t * (other.b - self.b),
        }
    }

    /// CSS `rgb()` form with each channel rounded half up.
    pub fn to_css(self) -> String {
        let channel = |c: f64| (c + 0.5).floor().clamp(0.0, 255.0) as u8;
        format!("rgb({},{},{})", channel(self.r), channel(self.g), channel(self.b))
    }
}

impl FromStr for Rgb {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let lower = raw.to_ascii_lowercase();
        let invalid = || ConfigError::invalid_value("Color", "color", raw);

        if let Some(inner) = lower.strip_prefix("rgb(").and_then(|v| v.strip_suffix(')')) {
            let channels: Vec<f64> = inner
                .split(',')
                .map(|c| c.trim().parse::<f64>())
                .collect::<Result<_, _>>()
                .map_err(|_| invalid())?;
            return match channels.as_slice() {
                [r, g, b] => Ok(Rgb::new(*r, *g, *b)),
                _ => Err(invalid()),
            };
        }

        if let Some(hex) = lower.strip_prefix('#') {
            let digits: Vec<u8> = match hex.len() {
                _ if !hex.is_ascii() => return Err(invalid()),
                3 => hex
                    .chars()
                    .map(|c| u8::from_str_radix(&format!("{c}{c}"), 16))
                    .collect::<Result<_, _>>()
                    .map_err(|_| invalid())?,
                6 => (0..3)
                    .map(|i| u8::from_str_radix(&hex[2 * i..2 * i + 2], 16))
                    .collect::<Result<_, _>>()
                    .map_err(|_| invalid())?,
                _ => return Err(invalid()),
            };
            return Ok(Rgb::new(
                digits[0] as f64,
                digits[1] as f64,
                digits[2] as f64,
            ));
        }

        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, (r, g, b))| Rgb::new(*r as f64, *g as f64, *b as f64))
            .ok_or_else(invalid)
    }
}

/// One entry of a color map.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorStop {
    pub value: f64,
    pub color: String,
    pub radius: Option<f64>,
}

/// Result of a color map lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    pub color: String,
    pub radius: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColorMap {
    /// Stops sorted by decreasing threshold.
    Discrete(Vec<ColorStop>),
    Continuous {
        min: (f64, Rgb, Option<f64>),
        max: (f64, Rgb, Option<f64>),
    },
}

impl ColorMap {
    pub fn discrete(mut stops: Vec<ColorStop>) -> Self {
        stops.sort_by(|a, b| b.value.total_cmp(&a.value));
        ColorMap::Discrete(stops)
    }

    /// Linear map between exactly two breakpoints, given in any order.
    pub fn continuous(component: &'static str, stops: &[ColorStop]) -> Result<Self, ConfigError> {
        let [a, b] = stops else {
            return Err(ConfigError::ContinuousBreakpoints {
                component,
                found: stops.len(),
            });
        };
        let (lo, hi) = if a.value <= b.value { (a, b) } else { (b, a) };
        Ok(ColorMap::Continuous {
            min: (lo.value, lo.color.parse()?, lo.radius),
            max: (hi.value, hi.color.parse()?, hi.radius),
        })
    }

    pub fn lookup(&self, value: f64) -> Option<Mark> {
        match self {
            ColorMap::Discrete(stops) => stops
                .iter()
                .find(|stop| value > stop.value)
                .map(|stop| Mark {
                    color: stop.color.clone(),
                    radius: stop.radius,
                }),
            ColorMap::Continuous { min, max } => {
                if value < min.0 || value > max.0 {
                    return None;
                }
                let t = if max.0 == min.0 {
                    0.0
                } else {
                    (value - min.0) / (max.0 - min.0)
                };
                let radius = match (min.2, max.2) {
                    (Some(r0), Some(r1)) => Some(r0 + t * (r1 - r0)),
                    _ => None,
                };
                Some(Mark {
                    color: min.1.lerp(max.1, t).to_css(),
                    radius,
                })
            }
        }
    }

    pub fn discrete_stops(&self) -> &[ColorStop] {
        match self {
            ColorMap::Discrete(stops) => stops,
            ColorMap::Continuous { .. } => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(value: f64, color: &str) -> ColorStop {
        ColorStop {
            value,
            color: color.to_string(),
            radius: None,
        }
    }

    #[test]
    fn discrete_takes_highest_exceeded_threshold() {
        let map = ColorMap::discrete(vec![stop(50.0, "red"), stop(80.0, "blue")]);
        assert_eq!(map.lookup(85.0).unwrap().color, "blue");
        assert_eq!(map.lookup(60.0).unwrap().color, "red");
        assert!(map.lookup(40.0).is_none());
        assert!(map.lookup(50.0).is_none());
    }

    #[test]
    fn continuous_interpolates_to_mid_gray() {
        let map = ColorMap::continuous("BootstrapProps", &[stop(0.0, "black"), stop(100.0, "white")])
            .unwrap();
        assert_eq!(map.lookup(50.0).unwrap().color, "rgb(128,128,128)");
        assert_eq!(map.lookup(0.0).unwrap().color, "rgb(0,0,0)");
        assert!(map.lookup(-1.0).is_none());
        assert!(map.lookup(101.0).is_none());
    }

    #[test]
    fn continuous_interpolates_radius() {
        let mut lo = stop(0.0, "rgb(0,0,0)");
        lo.radius = Some(2.0);
        let mut hi = stop(100.0, "#ffffff");
        hi.radius = Some(6.0);
        let map = ColorMap::continuous("BootstrapProps", &[hi, lo]).unwrap();
        assert_eq!(map.lookup(25.0).unwrap().radius, Some(3.0));
    }

    #[test]
    fn continuous_requires_two_breakpoints() {
        let err = ColorMap::continuous("BootstrapProps", &[stop(0.0, "black")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ContinuousBreakpoints { found: 1, .. }
        ));
    }

    #[test]
    fn parses_color_forms() {
        assert_eq!("#f00".parse::<Rgb>().unwrap(), Rgb::new(255.0, 0.0, 0.0));
        assert_eq!("rgb(1, 2, 3)".parse::<Rgb>().unwrap(), Rgb::new(1.0, 2.0, 3.0));
        assert_eq!("Grey".parse::<Rgb>().unwrap(), Rgb::new(128.0, 128.0, 128.0));
        assert!("not-a-color".parse::<Rgb>().is_err());
    }
}
