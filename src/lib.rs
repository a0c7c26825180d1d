pub mod category;
pub mod config;
pub mod controller;
pub mod loader;
pub mod map;
pub mod milmap_ui;
pub mod normalize;
pub mod source;
pub mod style;

#[cfg(test)]
mod test_utils;

pub use category::{Category, Selection};
pub use controller::{LayerController, LoadStatus};
