//! The egui map widget. It is the [`MapHost`] the GUI hands to the layer controller.

use egui::{Color32, InputState, PointerButton, Rect, Response, Sense, Ui, Widget};
use helpers::{
  MAX_ZOOM, MIN_ZOOM, fit_to_screen, point_to_coordinate, set_coordinate_to_pixel, show_box,
  zoom_for_level,
};
use log::debug;

use super::{
  coordinates::{BoundingBox, PixelCoordinate, PixelPosition, Transform, WGS84Coordinate},
  host::{FitOptions, MapHost, Popup, VectorLayer},
};
use crate::style::StyleConfig;

mod drawable;
mod helpers;
mod selection;

const BACKGROUND: Color32 = Color32::from_rgb(0xe8, 0xec, 0xef);

/// A popup opened by clicking a primitive.
#[derive(Debug, Clone)]
struct OpenPopup {
  anchor: PixelCoordinate,
  popup: Popup,
}

/// Pans with the primary mouse button, zooms with the wheel and `+`/`-`, `F` fits to the layer.
pub struct Map {
  transform: Transform,
  layer: Option<VectorLayer>,
  view: Option<(WGS84Coordinate, u8)>,
  fit: Option<(BoundingBox, FitOptions)>,
  size_invalid: bool,
  popup: Option<OpenPopup>,
  fit_padding: f32,
}

impl Default for Map {
  fn default() -> Self {
    Self::new()
  }
}

impl Map {
  #[must_use]
  pub fn new() -> Self {
    Self {
      transform: Transform::invalid(),
      layer: None,
      view: None,
      fit: None,
      size_invalid: true,
      popup: None,
      fit_padding: FitOptions::default().padding,
    }
  }

  /// The layer currently drawn.
  #[must_use]
  pub fn layer(&self) -> Option<&VectorLayer> {
    self.layer.as_ref()
  }

  #[must_use]
  pub fn transform(&self) -> &Transform {
    &self.transform
  }

  /// Title and body of the open popup.
  #[must_use]
  pub fn popup(&self) -> Option<&Popup> {
    self.popup.as_ref().map(|p| &p.popup)
  }

  fn apply_pending(&mut self, rect: Rect) {
    if self.size_invalid || self.transform.is_invalid() {
      debug!("Map size is now {rect:?}");
      if self.transform.is_invalid() {
        self.transform = Transform::default();
        set_coordinate_to_pixel(
          PixelCoordinate::new(1024., 1024.),
          rect.center().into(),
          &mut self.transform,
        );
      }
      self.size_invalid = false;
    }

    if let Some((center, zoom)) = self.view.take() {
      self.transform.zoom = zoom_for_level(zoom);
      set_coordinate_to_pixel(center.into(), rect.center().into(), &mut self.transform);
    }

    // A fit requested before the first frame knew its size is applied now.
    if let Some((bounds, options)) = self.fit.take() {
      show_box(&mut self.transform, &bounds, rect, options.padding);
    }
  }

  fn fit_to_layer(&mut self, rect: Rect) {
    if let Some(layer) = &self.layer {
      show_box(&mut self.transform, &layer.bounding_box(), rect, self.fit_padding);
    }
  }

  fn handle_keys(&mut self, events: impl Iterator<Item = egui::Event>, rect: Rect) {
    for event in events {
      if let egui::Event::Key {
        key, pressed: true, ..
      } = event
      {
        match key {
          egui::Key::ArrowDown => {
            self.transform.translate(PixelPosition { x: 0., y: -10. });
          }
          egui::Key::ArrowLeft => {
            self.transform.translate(PixelPosition { x: 10., y: 0. });
          }
          egui::Key::ArrowRight => {
            self.transform.translate(PixelPosition { x: -10., y: 0. });
          }
          egui::Key::ArrowUp => {
            self.transform.translate(PixelPosition { x: 0., y: 10. });
          }
          egui::Key::Minus => self.zoom_with_center(0.9, rect.center().into()),
          egui::Key::Plus | egui::Key::Equals => {
            self.zoom_with_center(1. / 0.9, rect.center().into());
          }
          egui::Key::F => self.fit_to_layer(rect),
          egui::Key::Escape => self.popup = None,
          _ => {}
        }
      }
    }
  }

  fn handle_mouse_wheel(&mut self, ui: &Ui, response: &Response) {
    if response.hovered() {
      let delta = ui
        .input(|i| {
          i.events
            .iter()
            .find_map(|e| match e {
              egui::Event::MouseWheel { delta, .. } => Some(*delta),
              _ => None,
            })
        })
        .map(|d| (d.y + 1.).clamp(0.8, 1.4).sqrt());
      if let Some(delta) = delta {
        let cursor = response.hover_pos().unwrap_or_default().into();
        self.zoom_with_center(delta, cursor);
      }
    }
  }

  fn zoom_with_center(&mut self, delta: f32, center: PixelPosition) {
    if self.transform.zoom * delta < MIN_ZOOM || self.transform.zoom * delta > MAX_ZOOM {
      return;
    }
    let hover_coord = point_to_coordinate(center, &self.transform);
    self.transform.zoom(delta);
    set_coordinate_to_pixel(hover_coord, center, &mut self.transform);
  }

  fn handle_click(&mut self, pos: egui::Pos2) {
    let click = point_to_coordinate(pos.into(), &self.transform);
    self.popup = self.layer.as_ref().and_then(|layer| {
      selection::closest_primitive(&layer.primitives, click, &self.transform).map(|i| OpenPopup {
        anchor: click,
        popup: layer.primitives[i].popup.clone(),
      })
    });
    if let Some(open) = &self.popup {
      debug!("Opened popup '{}: {}'", open.popup.title, open.popup.body);
    }
  }

  fn show_popup(&mut self, ui: &Ui, rect: Rect) {
    let Some(open) = &self.popup else {
      return;
    };
    let pos: egui::Pos2 = self.transform.apply(open.anchor).into();
    if !rect.contains(pos) {
      return;
    }
    let mut close = false;
    egui::Area::new(egui::Id::new("milmap_popup"))
      .fixed_pos(pos + egui::vec2(8., -8.))
      .order(egui::Order::Foreground)
      .show(ui.ctx(), |ui| {
        egui::Frame::popup(ui.style()).show(ui, |ui| {
          ui.strong(&open.popup.title);
          ui.label(&open.popup.body);
          if ui.small_button("✖").clicked() {
            close = true;
          }
        });
      });
    if close {
      self.popup = None;
    }
  }
}

impl MapHost for Map {
  fn set_view(&mut self, center: WGS84Coordinate, zoom: u8) {
    self.view = Some((center, zoom));
  }

  fn invalidate_size(&mut self) {
    self.size_invalid = true;
  }

  fn fit_bounds(&mut self, bounds: BoundingBox, options: FitOptions) {
    self.fit_padding = options.padding;
    self.fit = Some((bounds, options));
  }

  fn replace_layer(&mut self, layer: VectorLayer) {
    self.popup = None;
    self.layer = Some(layer);
  }

  fn restyle_layer(&mut self, style: StyleConfig) {
    if let Some(layer) = &mut self.layer {
      layer.style = style;
    }
  }

  fn clear_layer(&mut self) {
    self.popup = None;
    self.layer = None;
  }
}

impl Widget for &mut Map {
  fn ui(self, ui: &mut Ui) -> Response {
    let size = ui.available_size();
    let (rect, response) = ui.allocate_exact_size(size, Sense::click_and_drag());

    self.apply_pending(rect);
    self.handle_mouse_wheel(ui, &response);

    let events = ui.input(|i: &InputState| {
      i.events
        .iter()
        .filter(|e| matches!(e, egui::Event::Key { .. }))
        .cloned()
        .collect::<Vec<_>>()
    });
    if response.hovered() {
      self.handle_keys(events.into_iter(), rect);
    }

    if response.clicked()
      && let Some(pos) = response.interact_pointer_pos()
    {
      self.handle_click(pos);
    }

    if response.dragged() && response.dragged_by(PointerButton::Primary) {
      self.transform.translate(PixelPosition {
        x: response.drag_delta().x,
        y: response.drag_delta().y,
      });
    }

    fit_to_screen(&mut self.transform, &rect);

    if ui.is_rect_visible(rect) {
      let painter = ui.painter_at(rect);
      painter.rect_filled(rect, 0., BACKGROUND);
      if let Some(layer) = &self.layer {
        for primitive in &layer.primitives {
          drawable::draw(&painter, &primitive.geometry, &self.transform, &layer.style);
        }
      }
    }
    self.show_popup(ui, rect);

    response
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    map::{geometry_collection::Geometry, host::Primitive},
    style::DEFAULT_STYLE,
  };

  fn layer() -> VectorLayer {
    VectorLayer {
      primitives: vec![Primitive {
        geometry: Geometry::Point(WGS84Coordinate::new(54.52, 18.54).into()),
        popup: Popup {
          title: "Baza morska".to_string(),
          body: "Port Wojenny Gdynia".to_string(),
        },
      }],
      style: DEFAULT_STYLE,
    }
  }

  #[test]
  fn host_calls_are_applied_on_next_frame() {
    let mut map = Map::new();
    map.set_view(WGS84Coordinate::new(52.069_167, 19.480_556), 7);
    map.replace_layer(layer());
    let bounds = map.layer().unwrap().bounding_box();
    map.fit_bounds(bounds, FitOptions::default());
    assert!(map.transform().is_invalid());

    let rect = Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(800., 600.));
    map.apply_pending(rect);
    assert!(!map.transform().is_invalid());
    let center = map
      .transform()
      .apply(WGS84Coordinate::new(54.52, 18.54).into());
    assert!((center.x - 400.).abs() < 0.5);
    assert!((center.y - 300.).abs() < 0.5);
  }

  #[test]
  fn restyle_keeps_primitives() {
    let mut map = Map::new();
    map.replace_layer(layer());
    let thin = StyleConfig {
      stroke_weight: 1,
      ..DEFAULT_STYLE
    };
    map.restyle_layer(thin);
    assert_eq!(map.layer().unwrap().style, thin);
    assert_eq!(map.layer().unwrap().primitives.len(), 1);
    map.clear_layer();
    assert!(map.layer().is_none());
  }

  #[test]
  fn click_opens_popup_of_primitive() {
    let mut map = Map::new();
    map.replace_layer(layer());
    map.fit_bounds(map.layer().unwrap().bounding_box(), FitOptions::default());
    let rect = Rect::from_min_size(egui::Pos2::ZERO, egui::vec2(800., 600.));
    map.apply_pending(rect);

    map.handle_click(egui::pos2(401., 300.));
    assert_eq!(
      map.popup().map(|p| p.body.as_str()),
      Some("Port Wojenny Gdynia")
    );

    map.handle_click(egui::pos2(10., 10.));
    assert!(map.popup().is_none());
  }
}
