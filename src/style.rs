use std::ops::RangeInclusive;

use egui::Color32;
use serde::{Deserialize, Serialize};

pub const STROKE_WEIGHT_RANGE: RangeInclusive<u8> = 1..=10;
pub const FILL_OPACITY_RANGE: RangeInclusive<f32> = 0.1..=1.0;

/// The user editable rendering parameters of the military layer.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct StyleConfig {
  #[serde(with = "hex_color")]
  pub stroke_color: Color32,
  pub stroke_weight: u8,
  pub fill_opacity: f32,
}

pub const DEFAULT_STYLE: StyleConfig = StyleConfig {
  stroke_color: Color32::from_rgb(255, 0, 0),
  stroke_weight: 2,
  fill_opacity: 0.4,
};

impl Default for StyleConfig {
  fn default() -> Self {
    DEFAULT_STYLE
  }
}

/// A partial style edit. Numbers are taken as typed and clamped when applied.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct StyleUpdate {
  pub stroke_color: Option<Color32>,
  pub stroke_weight: Option<i64>,
  pub fill_opacity: Option<f32>,
}

impl StyleUpdate {
  #[must_use]
  pub fn with_color(mut self, color: Color32) -> Self {
    self.stroke_color = Some(color);
    self
  }

  #[must_use]
  pub fn with_weight(mut self, weight: i64) -> Self {
    self.stroke_weight = Some(weight);
    self
  }

  #[must_use]
  pub fn with_opacity(mut self, opacity: f32) -> Self {
    self.fill_opacity = Some(opacity);
    self
  }
}

#[must_use]
pub fn clamp_weight(weight: i64) -> u8 {
  let (min, max) = (*STROKE_WEIGHT_RANGE.start(), *STROKE_WEIGHT_RANGE.end());
  u8::try_from(weight.clamp(i64::from(min), i64::from(max))).unwrap_or(min)
}

/// NaN is treated as the minimum.
#[must_use]
pub fn clamp_opacity(opacity: f32) -> f32 {
  let (min, max) = (*FILL_OPACITY_RANGE.start(), *FILL_OPACITY_RANGE.end());
  if opacity.is_nan() {
    min
  } else {
    opacity.clamp(min, max)
  }
}

impl StyleConfig {
  /// Merges an update field by field. Out of range numbers are clamped.
  #[must_use]
  pub fn merged(mut self, update: &StyleUpdate) -> Self {
    if let Some(color) = update.stroke_color {
      self.stroke_color = color;
    }
    if let Some(weight) = update.stroke_weight {
      self.stroke_weight = clamp_weight(weight);
    }
    if let Some(opacity) = update.fill_opacity {
      self.fill_opacity = clamp_opacity(opacity);
    }
    self
  }

  /// Values read from a config file may be out of range as well.
  #[must_use]
  pub fn clamped(self) -> Self {
    Self {
      stroke_color: self.stroke_color,
      stroke_weight: clamp_weight(i64::from(self.stroke_weight)),
      fill_opacity: clamp_opacity(self.fill_opacity),
    }
  }

  /// The fill is the stroke color with the fill opacity.
  #[must_use]
  pub fn fill_color(&self) -> Color32 {
    let [r, g, b, _] = self.stroke_color.to_srgba_unmultiplied();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let alpha = (self.fill_opacity * 255.).round() as u8;
    Color32::from_rgba_unmultiplied(r, g, b, alpha)
  }
}

/// Holds the current style. Only explicit user edits change it.
#[derive(Debug, Default, Clone)]
pub struct StyleState {
  current: StyleConfig,
}

impl StyleState {
  #[must_use]
  pub fn new(initial: StyleConfig) -> Self {
    Self {
      current: initial.clamped(),
    }
  }

  #[must_use]
  pub fn current(&self) -> &StyleConfig {
    &self.current
  }

  /// Applies an update and returns whether anything changed.
  pub fn set_style(&mut self, update: &StyleUpdate) -> bool {
    let merged = self.current.merged(update);
    let changed = merged != self.current;
    self.current = merged;
    changed
  }
}

/// Parses `#rgb`, `#rrggbb` and `#rrggbbaa` colors.
#[must_use]
pub fn parse_color(color: &str) -> Option<Color32> {
  let hex = color.trim().strip_prefix('#')?;
  let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
  match hex.len() {
    3 => {
      let mut chars = hex.chars().map(|c| c.to_digit(16));
      let mut next = || -> Option<u8> { u8::try_from(chars.next()?? * 17).ok() };
      Some(Color32::from_rgb(next()?, next()?, next()?))
    }
    6 => Some(Color32::from_rgb(channel(0)?, channel(2)?, channel(4)?)),
    8 => Some(Color32::from_rgba_unmultiplied(
      channel(0)?,
      channel(2)?,
      channel(4)?,
      channel(6)?,
    )),
    _ => None,
  }
}

#[must_use]
pub fn format_color(color: Color32) -> String {
  let [r, g, b, _] = color.to_srgba_unmultiplied();
  format!("#{r:02x}{g:02x}{b:02x}")
}

mod hex_color {
  use egui::Color32;
  use serde::{Deserialize, Deserializer, Serializer, de::Error};

  pub fn serialize<S: Serializer>(color: &Color32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&super::format_color(*color))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Color32, D::Error> {
    let s = String::deserialize(deserializer)?;
    super::parse_color(&s).ok_or_else(|| D::Error::custom(format!("invalid color: {s}")))
  }
}
