//! The closed set of military installation categories and the user's selection among them.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A value of the OpenStreetMap `military=*` tag this application knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  Barracks,
  NavalBase,
  Airfield,
  TrainingArea,
  Range,
  Bunker,
  DangerArea,
  Checkpoint,
  Office,
}

/// All categories in registry order. Buttons, aggregate loads and merges follow this order.
pub const CATEGORIES: [Category; 9] = [
  Category::Barracks,
  Category::NavalBase,
  Category::Airfield,
  Category::TrainingArea,
  Category::Range,
  Category::Bunker,
  Category::DangerArea,
  Category::Checkpoint,
  Category::Office,
];

impl Category {
  #[must_use]
  pub fn all() -> &'static [Category] {
    &CATEGORIES
  }

  /// The identifier as used in the `military` tag and in static document names.
  #[must_use]
  pub fn id(self) -> &'static str {
    match self {
      Category::Barracks => "barracks",
      Category::NavalBase => "naval_base",
      Category::Airfield => "airfield",
      Category::TrainingArea => "training_area",
      Category::Range => "range",
      Category::Bunker => "bunker",
      Category::DangerArea => "danger_area",
      Category::Checkpoint => "checkpoint",
      Category::Office => "office",
    }
  }

  /// Human readable label shown in the UI.
  #[must_use]
  pub fn label(self) -> &'static str {
    match self {
      Category::Barracks => "Koszary",
      Category::NavalBase => "Baza morska",
      Category::Airfield => "Lotnisko wojskowe",
      Category::TrainingArea => "Poligon",
      Category::Range => "Strzelnica",
      Category::Bunker => "Bunkier",
      Category::DangerArea => "Strefa niebezpieczna",
      Category::Checkpoint => "Punkt kontrolny",
      Category::Office => "Biuro/Dowództwo",
    }
  }
}

impl Display for Category {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.id())
  }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
  type Err = UnknownCategory;

  fn from_str(input: &str) -> Result<Category, Self::Err> {
    let normalized = input.trim().to_lowercase();
    CATEGORIES
      .iter()
      .copied()
      .find(|c| c.id() == normalized)
      .ok_or_else(|| UnknownCategory(input.to_string()))
  }
}

/// What the user wants to see: a single category or the union of all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Selection {
  All,
  #[serde(untagged)]
  Category(Category),
}

pub const ALL_LABEL: &str = "Wszystkie";

impl Selection {
  /// The categories that have to be fetched for this selection, in registry order.
  #[must_use]
  pub fn categories(&self) -> &[Category] {
    match self {
      Selection::All => &CATEGORIES,
      Selection::Category(category) => std::slice::from_ref(category),
    }
  }

  #[must_use]
  pub fn label(&self) -> &'static str {
    match self {
      Selection::All => ALL_LABEL,
      Selection::Category(category) => category.label(),
    }
  }

  /// Labels of every fetched category, joined for messages.
  #[must_use]
  pub fn category_labels(&self) -> String {
    self
      .categories()
      .iter()
      .map(|c| c.label())
      .collect::<Vec<_>>()
      .join(", ")
  }
}

impl Default for Selection {
  fn default() -> Self {
    Selection::Category(Category::NavalBase)
  }
}

impl From<Category> for Selection {
  fn from(category: Category) -> Self {
    Selection::Category(category)
  }
}

impl Display for Selection {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Selection::All => write!(f, "all"),
      Selection::Category(category) => category.fmt(f),
    }
  }
}

impl FromStr for Selection {
  type Err = UnknownCategory;

  fn from_str(input: &str) -> Result<Selection, Self::Err> {
    if input.trim().eq_ignore_ascii_case("all") {
      Ok(Selection::All)
    } else {
      input.parse().map(Selection::Category)
    }
  }
}
