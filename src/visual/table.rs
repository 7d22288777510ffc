use crate::data::trip_struct::Trip;
use eframe::egui;
use egui_extras::{Column, TableBuilder};

pub const TOP_N: usize = 10;
pub const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Opciones del selector `sortBy`: (clave, etiqueta).
pub const SORT_FIELDS: [(&str, &str); 5] = [
    ("trip_distance_km", "Distancia (km)"),
    ("speed_kmph", "Velocidad (km/h)"),
    ("trip_duration", "Duración (s)"),
    ("passenger_count", "Pasajeros"),
    ("pickup_hour", "Hora"),
];

pub fn sort_label(field: &str) -> &str {
    SORT_FIELDS
        .iter()
        .find(|(key, _)| *key == field)
        .map_or(field, |(_, label)| *label)
}

pub fn weekday_name(day: f64) -> &'static str {
    WEEKDAYS[(day.trunc() as i64).rem_euclid(7) as usize]
}

#[derive(Debug, Clone, PartialEq)]
pub struct TripRow {
    pub trip_id: String,
    pub distance: String,
    pub speed: String,
    pub duration: String,
    pub hour: String,
    pub weekday: &'static str,
}

impl TripRow {
    fn from_trip(trip: &Trip) -> Self {
        Self {
            trip_id: trip.trip_id.clone(),
            distance: format!("{:.2}", trip.trip_distance_km),
            speed: format!("{:.2}", trip.speed_kmph),
            duration: format!("{}", trip.trip_duration),
            hour: format!("{}", trip.pickup_hour),
            weekday: weekday_name(trip.pickup_dayofweek),
        }
    }
}

/// Cuerpo de la tabla `topTripsBody`.
#[derive(Debug, Default)]
pub struct TopTripsTable {
    rows: Vec<TripRow>,
}

impl TopTripsTable {
    /// Reconstruye las filas: copia ordenada de mayor a menor por `sort_field`, primeras 10.
    pub fn render_top_trips(&mut self, trips: &[Trip], sort_field: &str) {
        self.rows.clear();

        let mut sorted: Vec<&Trip> = trips.iter().collect();
        sorted.sort_by(|a, b| b.field(sort_field).total_cmp(&a.field(sort_field)));

        self.rows
            .extend(sorted.into_iter().take(TOP_N).map(TripRow::from_trip));
    }

    pub fn rows(&self) -> &[TripRow] {
        &self.rows
    }

    pub fn show(&self, ui: &mut egui::Ui) {
        if self.rows.is_empty() {
            ui.label(egui::RichText::new("No hay viajes para mostrar.").italics().weak());
            return;
        }

        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::remainder().at_least(80.0)) // ID
            .column(Column::remainder().at_least(60.0)) // Distancia
            .column(Column::remainder().at_least(60.0)) // Velocidad
            .column(Column::remainder().at_least(60.0)) // Duración
            .column(Column::remainder().at_least(40.0)) // Hora
            .column(Column::remainder().at_least(40.0)) // Día
            .header(20.0, |mut header| {
                for title in ["ID", "Distancia (km)", "Velocidad (km/h)", "Duración (s)", "Hora", "Día"] {
                    header.col(|ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for trip in &self.rows {
                    body.row(18.0, |mut row| {
                        row.col(|ui| {
                            ui.label(&trip.trip_id);
                        });
                        row.col(|ui| {
                            ui.label(&trip.distance);
                        });
                        row.col(|ui| {
                            ui.label(&trip.speed);
                        });
                        row.col(|ui| {
                            ui.label(&trip.duration);
                        });
                        row.col(|ui| {
                            ui.label(&trip.hour);
                        });
                        row.col(|ui| {
                            ui.label(trip.weekday);
                        });
                    });
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn trip(id: &str, distance: f64, duration: f64, day: f64) -> Trip {
        Trip::from_value(json!({
            "trip_id": id,
            "trip_distance_km": distance,
            "speed_kmph": 12.346,
            "trip_duration": duration,
            "pickup_hour": 7,
            "pickup_dayofweek": day,
            "tip": (if distance > 3.0 { json!("2.5") } else { json!(null) })
        }))
    }

    #[test]
    fn test_top_ten_descending() {
        let trips: Vec<Trip> = (0..15)
            .map(|i| trip(&format!("t{}", i), i as f64, 100.0, 1.0))
            .collect();
        let mut table = TopTripsTable::default();
        table.render_top_trips(&trips, "trip_distance_km");

        let ids: Vec<&str> = table.rows().iter().map(|r| r.trip_id.as_str()).collect();
        assert_eq!(ids, vec!["t14", "t13", "t12", "t11", "t10", "t9", "t8", "t7", "t6", "t5"]);
        assert_eq!(table.rows()[0].distance, "14.00");
        assert_eq!(table.rows()[0].speed, "12.35");
    }

    #[test]
    fn test_rows_rebuilt_each_call() {
        let trips = vec![trip("a", 1.0, 10.0, 1.0), trip("b", 2.0, 5.0, 1.0)];
        let mut table = TopTripsTable::default();
        table.render_top_trips(&trips, "trip_distance_km");
        table.render_top_trips(&trips[..1], "trip_duration");
        assert_eq!(table.rows().len(), 1);
        assert_eq!(table.rows()[0].trip_id, "a");
    }

    #[test]
    fn test_unknown_sort_field_keeps_order() {
        let trips = vec![trip("a", 1.0, 10.0, 1.0), trip("b", 5.0, 5.0, 1.0), trip("c", 4.0, 7.0, 1.0)];
        let mut table = TopTripsTable::default();
        table.render_top_trips(&trips, "no_such_field");
        let ids: Vec<&str> = table.rows().iter().map(|r| r.trip_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        // passthrough con valores faltantes cuentan como 0
        table.render_top_trips(&trips, "tip");
        let ids: Vec<&str> = table.rows().iter().map(|r| r.trip_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_row_formatting() {
        let mut table = TopTripsTable::default();
        table.render_top_trips(&[trip("x", 2.0, 600.0, 9.0), trip("y", 1.0, 455.5, 0.0)], "trip_distance_km");
        assert_eq!(table.rows()[0].duration, "600");
        assert_eq!(table.rows()[0].hour, "7");
        assert_eq!(table.rows()[0].weekday, "Tue");
        assert_eq!(table.rows()[1].duration, "455.5");
        assert_eq!(table.rows()[1].weekday, "Sun");
    }

    #[test]
    fn test_weekday_name_wraps() {
        assert_eq!(weekday_name(0.0), "Sun");
        assert_eq!(weekday_name(6.0), "Sat");
        assert_eq!(weekday_name(7.0), "Sun");
        assert_eq!(weekday_name(-1.0), "Sat");
    }

    #[test]
    fn test_sort_label() {
        assert_eq!(sort_label("speed_kmph"), "Velocidad (km/h)");
        assert_eq!(sort_label("otro"), "otro");
    }
}
