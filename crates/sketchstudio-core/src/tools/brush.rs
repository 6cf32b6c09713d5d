//! Brush variants for the freehand tool and text tool options.

use crate::color::Color;
use crate::shapes::{FontFamily, ShapeStyle, Text};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Freehand brush kind. Every kind draws the same stroke primitive; they only
/// differ in width, alpha and opacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrushKind {
    #[default]
    Pencil,
    Marker,
    Spray,
    Crayon,
    Calligraphy,
    Oil,
}

impl BrushKind {
    pub fn all() -> &'static [BrushKind] {
        &[
            BrushKind::Pencil,
            BrushKind::Marker,
            BrushKind::Spray,
            BrushKind::Crayon,
            BrushKind::Calligraphy,
            BrushKind::Oil,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            BrushKind::Pencil => "pencil",
            BrushKind::Marker => "marker",
            BrushKind::Spray => "spray",
            BrushKind::Crayon => "crayon",
            BrushKind::Calligraphy => "calligraphy",
            BrushKind::Oil => "oil",
        }
    }

    /// Multiplier applied to the base stroke width.
    pub fn width_factor(&self) -> f64 {
        match self {
            BrushKind::Marker => 2.0,
            BrushKind::Calligraphy => 0.7,
            BrushKind::Oil => 3.0,
            BrushKind::Pencil | BrushKind::Spray | BrushKind::Crayon => 1.0,
        }
    }

    /// Stroke style for a new stroke drawn with this brush.
    pub fn stroke_style(&self, color: Color, width: f64) -> ShapeStyle {
        let stroke_color = match self {
            BrushKind::Crayon => color.with_alpha(0x80),
            _ => color,
        };
        let opacity = match self {
            BrushKind::Spray => 0.5,
            _ => 1.0,
        };
        ShapeStyle {
            stroke_color,
            stroke_width: width * self.width_factor(),
            fill_color: None,
            opacity,
        }
    }
}

impl FromStr for BrushKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BrushKind::all()
            .iter()
            .copied()
            .find(|b| b.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown brush: {s}"))
    }
}

/// Font settings used for newly inserted text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextOptions {
    pub font_family: FontFamily,
    pub font_size: f64,
    pub color: Color,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            font_family: FontFamily::default(),
            font_size: Text::DEFAULT_FONT_SIZE,
            color: Color::BLACK,
        }
    }
}
