//! Desktop window: the label on top, the button below

use eframe::egui;

use crate::{
    app::{EngineHoursApp, BUTTON_TEXT},
    config::GuiConfig,
    connection::Connector,
};

const TEXT_SIZE: f32 = 24.0;

pub struct EngineHoursWindow<C: Connector> {
    app: EngineHoursApp<C>,
}

impl<C: Connector> EngineHoursWindow<C> {
    pub fn new(app: EngineHoursApp<C>) -> Self {
        Self { app }
    }
}

impl<C: Connector> eframe::App for EngineHoursWindow<C> {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let half = egui::vec2(ui.available_width(), ui.available_height() / 2.0);

            ui.allocate_ui_with_layout(
                half,
                egui::Layout::centered_and_justified(egui::Direction::TopDown),
                |ui| {
                    ui.label(egui::RichText::new(self.app.label()).size(TEXT_SIZE));
                },
            );

            let button = egui::Button::new(egui::RichText::new(BUTTON_TEXT).size(TEXT_SIZE));
            if ui.add_sized(half, button).clicked() {
                // blocks the frame until the adapter answers or times out
                self.app.get_engine_hours();
            }
        });
    }
}

/// Open the window and run until it is closed
pub fn run_gui<C: Connector + 'static>(
    app: EngineHoursApp<C>,
    config: &GuiConfig,
) -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.width as f32, config.height as f32])
            .with_title("Engine Hours"),
        ..Default::default()
    };

    eframe::run_native(
        "Engine Hours",
        options,
        Box::new(move |_cc| Box::new(EngineHoursWindow::new(app))),
    )
}
