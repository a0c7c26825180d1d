use egui::{Color32, RichText, Widget as _};

use crate::{
  category::{CATEGORIES, Selection},
  controller::{LayerController, LoadStatus},
  map::milmap_egui::Map,
  style::{FILL_OPACITY_RANGE, STROKE_WEIGHT_RANGE, StyleUpdate},
};

const WARNING_COLOR: Color32 = Color32::from_rgb(0xb7, 0x1c, 0x1c);

/// Holds the UI data of milmap.
pub struct MilmapApp {
  controller: LayerController<Map>,
}

impl MilmapApp {
  #[must_use]
  pub fn new(controller: LayerController<Map>) -> Self {
    Self { controller }
  }

  #[must_use]
  pub fn controller(&self) -> &LayerController<Map> {
    &self.controller
  }

  pub fn controller_mut(&mut self) -> &mut LayerController<Map> {
    &mut self.controller
  }

  fn category_bar(&mut self, ui: &mut egui::Ui) {
    let active = self.controller.selection();
    let selections = CATEGORIES
      .iter()
      .map(|&c| Selection::Category(c))
      .chain(std::iter::once(Selection::All));

    ui.horizontal_wrapped(|ui| {
      for selection in selections {
        let label = selection.label();
        let response = ui
          .selectable_label(selection == active, label)
          .on_hover_text(format!("Kliknij, aby wczytać: {label}"));
        if response.clicked() {
          log::info!("User selected {selection}");
          self.controller.select(selection);
        }
      }
    });
  }

  fn style_panel(&mut self, ui: &mut egui::Ui) {
    ui.heading("Edycja stylu");
    ui.separator();

    let style = *self.controller.style();
    let mut update = StyleUpdate::default();

    ui.horizontal(|ui| {
      ui.label("Kolor:");
      let mut color = style.stroke_color;
      if ui.color_edit_button_srgba(&mut color).changed() {
        update.stroke_color = Some(color);
      }
      ui.monospace(crate::style::format_color(color));
    });

    ui.label(format!("Grubość: {}px", style.stroke_weight));
    let mut weight = style.stroke_weight;
    if ui
      .add(egui::Slider::new(&mut weight, STROKE_WEIGHT_RANGE).show_value(false))
      .changed()
    {
      update.stroke_weight = Some(i64::from(weight));
    }

    #[allow(clippy::cast_possible_truncation)]
    let percent = (style.fill_opacity * 100.).round() as i32;
    ui.label(format!("Przezroczystość: {percent}%"));
    let mut opacity = style.fill_opacity;
    if ui
      .add(
        egui::Slider::new(&mut opacity, FILL_OPACITY_RANGE)
          .step_by(0.05)
          .show_value(false),
      )
      .changed()
    {
      update.fill_opacity = Some(opacity);
    }

    if update != StyleUpdate::default() {
      self.controller.set_style(&update);
    }
  }

  fn legend(&self, ctx: &egui::Context) {
    egui::Area::new(egui::Id::new("legend"))
      .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(12., -12.))
      .show(ctx, |ui| {
        egui::Frame::popup(ui.style()).show(ui, |ui| {
          ui.label(format!(
            "Aktualna warstwa: {}",
            self.controller.active_label()
          ));
          ui.label(format!(
            "Liczba obiektów: {}",
            self.controller.feature_count()
          ));
        });
      });
  }

  fn status_overlay(&self, ctx: &egui::Context) {
    let text = match self.controller.status() {
      LoadStatus::Loading => RichText::new(format!(
        "Pobieranie: {}...",
        self.controller.active_label()
      )),
      LoadStatus::Empty | LoadStatus::Error(_) => match self.controller.message() {
        Some(message) => RichText::new(format!("⚠ {message}")).color(WARNING_COLOR),
        None => return,
      },
      LoadStatus::Idle | LoadStatus::Ready => return,
    };

    egui::Area::new(egui::Id::new("status_overlay"))
      .anchor(egui::Align2::CENTER_TOP, egui::vec2(0., 12.))
      .order(egui::Order::Foreground)
      .show(ctx, |ui| {
        egui::Frame::popup(ui.style()).show(ui, |ui| {
          ui.label(text.strong());
        });
      });
  }
}

impl eframe::App for MilmapApp {
  fn ui(&mut self, ui: &mut egui::Ui, _frame: &mut eframe::Frame) {
    self.controller.poll();

    egui::TopBottomPanel::top("categories").show_inside(ui, |ui| {
      self.category_bar(ui);
    });

    egui::SidePanel::right("style")
      .resizable(false)
      .show_inside(ui, |ui| {
        self.style_panel(ui);
      });

    egui::CentralPanel::default()
      .frame(egui::Frame::NONE)
      .show_inside(ui, |ui| {
        self.controller.host_mut().ui(ui);
      });

    self.legend(ui.ctx());
    self.status_overlay(ui.ctx());
  }
}
