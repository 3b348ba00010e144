use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Diagonal gradient stops (offset, rgb) painted across the canvas.
pub const GRADIENT_STOPS: [(f32, [u8; 3]); 4] = [
    (0.0, [206, 0, 206]),
    (0.45, [55, 99, 242]),
    (0.55, [64, 211, 44]),
    (1.0, [221, 83, 0]),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlockColor {
    #[default]
    Red,
    Blue,
    Yellow,
    Green,
    Gradient,
}

impl FlockColor {
    pub const ALL: [FlockColor; 5] = [
        FlockColor::Red,
        FlockColor::Blue,
        FlockColor::Yellow,
        FlockColor::Green,
        FlockColor::Gradient,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Gradient => "gradient",
        }
    }

    /// Solid fill, or `None` when the renderer should paint [`GRADIENT_STOPS`].
    pub fn rgb(self) -> Option<[u8; 3]> {
        match self {
            Self::Red => Some([255, 0, 0]),
            Self::Blue => Some([0, 0, 255]),
            Self::Yellow => Some([255, 255, 0]),
            Self::Green => Some([0, 128, 0]),
            Self::Gradient => None,
        }
    }
}

impl fmt::Display for FlockColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlockColor {
    type Err = SimError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let normalized = tag.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|color| color.as_str() == normalized)
            .ok_or_else(|| SimError::UnknownColor(tag.to_string()))
    }
}

/// How the renderer outlines the audio ring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawMode {
    #[default]
    None,
    Lines,
    QuadCurves,
    CubicCurves,
    Bars,
}

impl DrawMode {
    pub fn from_u32(value: u32) -> Self {
        match value {
            1 => Self::Lines,
            2 => Self::QuadCurves,
            3 => Self::CubicCurves,
            4 => Self::Bars,
            _ => Self::None,
        }
    }

    pub fn as_u32(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Lines => 1,
            Self::QuadCurves => 2,
            Self::CubicCurves => 3,
            Self::Bars => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Lines => "Lines",
            Self::QuadCurves => "QuadCurves",
            Self::CubicCurves => "CubicCurves",
            Self::Bars => "Bars",
        }
    }
}

impl FromStr for DrawMode {
    type Err = SimError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "lines" => Ok(Self::Lines),
            "quadcurves" => Ok(Self::QuadCurves),
            "cubiccurves" => Ok(Self::CubicCurves),
            "bars" => Ok(Self::Bars),
            _ => Err(SimError::UnknownDrawMode(tag.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DrawMode, FlockColor};
    use crate::error::SimError;

    #[test]
    fn parses_color_tags_case_insensitively() {
        assert_eq!("Blue".parse::<FlockColor>(), Ok(FlockColor::Blue));
        assert_eq!(" gradient ".parse::<FlockColor>(), Ok(FlockColor::Gradient));
        assert_eq!(
            "purple".parse::<FlockColor>(),
            Err(SimError::UnknownColor("purple".to_string()))
        );
    }

    #[test]
    fn only_gradient_lacks_solid_fill() {
        for color in FlockColor::ALL {
            assert_eq!(color.rgb().is_none(), color == FlockColor::Gradient);
            assert_eq!(color.to_string().parse::<FlockColor>(), Ok(color));
        }
    }

    #[test]
    fn draw_mode_u32_mapping_is_stable() {
        for value in 0..5 {
            assert_eq!(DrawMode::from_u32(value).as_u32(), value);
        }
        assert_eq!(DrawMode::from_u32(99), DrawMode::None);
        assert_eq!("QuadCurves".parse::<DrawMode>(), Ok(DrawMode::QuadCurves));
        assert!("Spiral".parse::<DrawMode>().is_err());
    }
}
