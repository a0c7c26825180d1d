/// Contains everything needed to handle coordinates.
pub mod coordinates;
/// Handles geometry.
pub mod geometry_collection;
/// The interface of the map canvas.
pub mod host;
/// The map widget.
pub mod milmap_egui;
/// Puts geometry onto a host.
pub mod render;
