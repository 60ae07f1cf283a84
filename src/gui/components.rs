    use eframe::egui;

    /// Font size used for every line of the widget
    pub const FONT_SIZE: f32 = 16.0;

    /// One `label: value` line, label on the left and value pushed to the right edge.
    /// `hover` is attached to the value, used for the reason a count is missing.
    pub fn count_row(ui: &mut egui::Ui, label: &str, value: &str, color: egui::Color32, hover: Option<&str>) {
        ui.horizontal(|ui| {
            ui.add_space(10.0);
            ui.label(egui::RichText::new(format!("{}:", label)).size(FONT_SIZE));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.add_space(10.0);
                let response = ui.label(egui::RichText::new(value).size(FONT_SIZE).color(color).strong());
                if let Some(text) = hover {
                    response.on_hover_text(text);
                }
            });
        });
    }

    pub fn centered_line(ui: &mut egui::Ui, text: &str, color: egui::Color32) {
        ui.vertical_centered(|ui| {
            ui.label(egui::RichText::new(text).size(FONT_SIZE).color(color));
        });
    }
