// Window state and rendering for the counter widget

// Row and line helpers
use crate::gui::{centered_line, count_row};
// Counting and render model for each refresh tick
use crate::gui::refresher::{CountCell, RenderModel, TOTAL_LABEL, fetch_counts};
// Counting tool seam
use crate::counter::CountTool;
// Loaded config and per-entry results
use crate::models::{Config, CountResult};
// Local wall clock for the countdown
use chrono::Local;
// Import egui for UI rendering
use eframe::egui;
// Duration and Instant for time-based operations
use std::time::{Duration, Instant};
use tracing::info;

/// Color of the count values.
const VALUE_COLOR: egui::Color32 = egui::Color32::from_rgb(59, 130, 246);
/// Color of a missing count and of the countdown once the deadline has passed.
const ALERT_COLOR: egui::Color32 = egui::Color32::from_rgb(239, 68, 68);

/// Main application state for the eframe app.
/// Holds the immutable config, the counting tool and the results of the last refresh.
pub struct AppState {
    /// Config loaded at startup, never modified
    config: Config,

    /// Tool used to count each source file
    tool: Box<dyn CountTool>,

    /// Results of the last refresh, in config order
    counts: Vec<CountResult>,

    /// Timestamp of the last refresh
    last_refresh: Instant,
}

impl AppState {
    /// Creates the application state and performs the first count
    /// so the window never opens empty.
    ///
    /// # Arguments
    /// * `cc` - eframe creation context containing egui context
    /// * `config` - validated config
    /// * `tool` - counting tool used on every refresh
    pub fn new(cc: &eframe::CreationContext<'_>, config: Config, tool: Box<dyn CountTool>) -> Self {
        // Configure light theme for consistent appearance
        cc.egui_ctx.set_visuals(egui::Visuals::light());

        let mut s = Self {
            config,
            tool,
            counts: Vec::new(),
            last_refresh: Instant::now(),
        };

        s.refresh();

        s
    }

    /// Re-runs the counting tool for every entry and resets the refresh timer.
    fn refresh(&mut self) {
        self.counts = fetch_counts(&self.config, self.tool.as_ref());
        self.last_refresh = Instant::now();
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        // egui-winit turns Ctrl+C into a Copy event
        let close = ctx.input(|i| {
            i.events.iter().any(|e| matches!(e, egui::Event::Copy))
                || (i.modifiers.ctrl && i.key_pressed(egui::Key::C))
        });
        if close {
            info!("closing on Ctrl+C");
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        if ctx.input(|i| i.key_pressed(egui::Key::F5)) {
            self.refresh();
        }
    }
}

impl eframe::App for AppState {
    /// Called every frame. Refreshes counts when due and draws the rows,
    /// the total and the countdown.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Repaint every second to keep the countdown ticking
        ctx.request_repaint_after(Duration::from_secs(1));

        self.handle_shortcuts(ctx);

        if self.last_refresh.elapsed() >= self.config.refresh_interval {
            self.refresh();
        }

        let model = RenderModel::build(&self.config, &self.counts, Local::now().naive_local());

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(4.0);

            // Refresh button in the top right corner
            ui.horizontal(|ui| {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let refresh_btn = egui::Button::new(egui::RichText::new("🔄").size(14.0)).frame(false);
                    if ui.add(refresh_btn).on_hover_text("Refresh (F5)").clicked() {
                        self.refresh();
                    }
                });
            });

            for row in &model.rows {
                match &row.cell {
                    CountCell::Count(n) => count_row(ui, &row.display, &n.to_string(), VALUE_COLOR, None),
                    CountCell::Unavailable { detail, .. } => {
                        count_row(ui, &row.display, &row.cell.to_string(), ALERT_COLOR, Some(detail.as_str()))
                    }
                }
            }

            if let Some(total) = &model.total {
                ui.separator();
                let color = if total.failed > 0 { ALERT_COLOR } else { VALUE_COLOR };
                let hover = (total.failed > 0).then(|| format!("{} entries are not counted", total.failed));
                count_row(ui, TOTAL_LABEL, &total.to_string(), color, hover.as_deref());
            }

            ui.add_space(6.0);
            ui.separator();
            centered_line(
                ui,
                &format!("Deadline {}", model.deadline_label),
                egui::Color32::from_gray(100),
            );
            let color = if model.remaining.is_overdue() {
                ALERT_COLOR
            } else {
                egui::Color32::from_gray(40)
            };
            centered_line(ui, &model.remaining_text(), color);
        });
    }
}
