use crate::app::{Command, Dashboard};
use crate::config::{DashboardConfig, TripSource};
use crate::data::data_lector::{self, PendingLoads};
use crate::data::filters::{FilterParams, PeakMode};
use crate::visual::table::{SORT_FIELDS, sort_label};
use eframe::{self, egui};
use log::info;
use std::sync::mpsc::{self, Receiver, Sender};

const PEAK_OPTIONS: [(PeakMode, &str); 3] = [
    (PeakMode::Any, "Todas las horas"),
    (PeakMode::Morning, "Pico mañana (L-V 8-10h)"),
    (PeakMode::Evening, "Pico tarde (L-V 17-19h)"),
];

struct DashboardApp {
    dashboard: Dashboard,
    config: DashboardConfig,

    // Formulario de filtros
    min_distance: String,
    max_distance: String,
    peak_hours: PeakMode,
    sort_by: String,

    // Canal de comandos desde el hilo de carga
    commands_tx: Sender<Command>,
    commands_rx: Receiver<Command>,
    pending_loads: PendingLoads,
}

impl DashboardApp {
    fn new(ctx: egui::Context, config: DashboardConfig) -> Self {
        let (commands_tx, commands_rx) = mpsc::channel();
        let dashboard = Dashboard::default();
        let sort_by = dashboard.sort_field().to_string();

        let app = Self {
            dashboard,
            config,
            min_distance: String::new(),
            max_distance: String::new(),
            peak_hours: PeakMode::Any,
            sort_by,
            commands_tx,
            commands_rx,
            pending_loads: PendingLoads::default(),
        };
        // La carga inicial arranca apenas se abre la ventana
        app.load(ctx);
        app
    }

    fn load(&self, ctx: egui::Context) {
        // Puede haber otra carga en curso; gana la última en llegar
        self.pending_loads.start();
        let pending = self.pending_loads.clone();

        data_lector::spawn_load(&self.config, self.commands_tx.clone(), move || {
            pending.finish();
            ctx.request_repaint();
        });
    }

    fn pick_file(&mut self, ctx: &egui::Context) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Viajes", &["csv", "json"])
            .pick_file()
        {
            info!("Cargando viajes desde {}", path.display());
            self.config.source = TripSource::File(path);
            self.load(ctx.clone());
        }
    }

    fn drain_commands(&mut self) {
        while let Ok(command) = self.commands_rx.try_recv() {
            self.dashboard.dispatch(command);
        }
    }

    fn show_summary(&self, ui: &mut egui::Ui) {
        let summary = self.dashboard.summary();
        ui.columns(3, |cols| {
            cols[0].vertical(|ui| {
                ui.label("Total de viajes");
                ui.heading(summary.count.to_string()); // totalTrips
            });
            cols[1].vertical(|ui| {
                ui.label("Duración media (s)");
                ui.heading(summary.avg_duration_text()); // avgDuration
            });
            cols[2].vertical(|ui| {
                ui.label("Pasajeros más comunes");
                ui.heading(summary.modal_passenger_text()); // commonPassenger
            });
        });
    }

    fn show_filters(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Distancia mínima (km):");
            ui.add(
                egui::TextEdit::singleline(&mut self.min_distance)
                    .id_salt("minDistance")
                    .hint_text("0")
                    .desired_width(80.0),
            );

            ui.label("Distancia máxima (km):");
            ui.add(
                egui::TextEdit::singleline(&mut self.max_distance)
                    .id_salt("maxDistance")
                    .hint_text("∞")
                    .desired_width(80.0),
            );

            let selected = PEAK_OPTIONS
                .iter()
                .find(|(mode, _)| *mode == self.peak_hours)
                .map_or("", |(_, label)| *label);
            egui::ComboBox::from_id_salt("peakHours")
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    for (mode, label) in PEAK_OPTIONS {
                        ui.selectable_value(&mut self.peak_hours, mode, label);
                    }
                });
        });

        ui.horizontal(|ui| {
            if ui.button("Aplicar filtros").clicked() {
                let params = FilterParams::from_inputs(
                    &self.min_distance,
                    &self.max_distance,
                    self.peak_hours.as_str(),
                );
                self.dashboard.dispatch(Command::ApplyFilters(params));
            }

            if ui.button("Restablecer").clicked() {
                self.min_distance.clear();
                self.max_distance.clear();
                self.peak_hours = PeakMode::Any;
                self.dashboard.dispatch(Command::ResetFilters);
            }

            if ui.button("Cargar archivo").clicked() {
                self.pick_file(ui.ctx());
            }

            if self.pending_loads.is_loading() {
                ui.label("Cargando viajes...");
                ui.spinner();
            } else {
                ui.label(
                    egui::RichText::new(format!(
                        "{} de {} viajes · {}",
                        self.dashboard.trips().len(),
                        self.dashboard.all_trips().len(),
                        self.config.source.describe()
                    ))
                    .weak(),
                );
            }
        });
    }

    fn show_top_trips(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.strong("Top 10 viajes por");
            let before = self.sort_by.clone();
            egui::ComboBox::from_id_salt("sortBy")
                .selected_text(sort_label(&self.sort_by))
                .show_ui(ui, |ui| {
                    for (key, label) in SORT_FIELDS {
                        ui.selectable_value(&mut self.sort_by, key.to_string(), label);
                    }
                });
            if self.sort_by != before {
                self.dashboard.dispatch(Command::ChangeSort(self.sort_by.clone()));
            }
        });

        egui::ScrollArea::vertical()
            .id_salt("topTripsScroll")
            .max_height(300.0)
            .show(ui, |ui| {
                self.dashboard.table().show(ui);
            });
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_commands();

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            ui.heading("NYC Taxi · Movilidad");
            self.show_summary(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                egui::CollapsingHeader::new("Filtros")
                    .default_open(true)
                    .show(ui, |ui| {
                        self.show_filters(ui);
                    });

                ui.separator();
                self.dashboard.charts().show(ui);

                ui.separator();
                self.show_top_trips(ui);
            });
        });
    }
}

pub fn run_app(config: DashboardConfig) -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 800.0])
            .with_resizable(true),
        ..Default::default()
    };

    eframe::run_native(
        "NYC Taxi Mobility Insights",
        options,
        Box::new(move |cc| Ok(Box::new(DashboardApp::new(cc.egui_ctx.clone(), config)))),
    )
}
