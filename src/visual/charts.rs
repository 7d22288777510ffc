use crate::data::stats::{HOURS, HourlyHistograms};
use eframe::egui::{self, Color32};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints};
use std::ops::RangeInclusive;

const BAR_WIDTH: f64 = 0.27;

pub fn hour_labels() -> Vec<String> {
    (0..HOURS).map(|h| format!("{}:00", h)).collect()
}

/// Barras agrupadas: total, pico mañana y pico tarde por hora.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyTripsChart {
    pub labels: Vec<String>,
    pub total: Vec<f64>,
    pub morning: Vec<f64>,
    pub evening: Vec<f64>,
}

/// Línea de duración media por hora.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationChart {
    pub labels: Vec<String>,
    pub avg_duration: Vec<f64>,
}

fn as_series(counts: &[usize; HOURS]) -> Vec<f64> {
    counts.iter().map(|&c| c as f64).collect()
}

/// Etiqueta del eje X solo en horas enteras.
fn hour_formatter(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark, _range| {
        let v = mark.value;
        if v.fract() == 0.0 && v >= 0.0 && (v as usize) < labels.len() {
            labels[v as usize].clone()
        } else {
            String::new()
        }
    }
}

fn bars(values: &[f64], offset: f64) -> Vec<Bar> {
    values
        .iter()
        .enumerate()
        .map(|(hour, &v)| Bar::new(hour as f64 + offset, v).width(BAR_WIDTH))
        .collect()
}

impl HourlyTripsChart {
    fn show(&self, ui: &mut egui::Ui) {
        Plot::new("tripsChart")
            .legend(Legend::default())
            .x_axis_formatter(hour_formatter(self.labels.clone()))
            .height(220.0)
            .x_axis_label("Hora del día")
            .y_axis_label("Viajes")
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(
                    BarChart::new(bars(&self.total, -BAR_WIDTH))
                        .name("Total")
                        .color(Color32::from_rgb(54, 162, 235)),
                );
                plot_ui.bar_chart(
                    BarChart::new(bars(&self.morning, 0.0))
                        .name("Pico mañana")
                        .color(Color32::from_rgb(255, 159, 64)),
                );
                plot_ui.bar_chart(
                    BarChart::new(bars(&self.evening, BAR_WIDTH))
                        .name("Pico tarde")
                        .color(Color32::from_rgb(153, 102, 255)),
                );
            });
    }
}

impl DurationChart {
    fn show(&self, ui: &mut egui::Ui) {
        let points: PlotPoints = self
            .avg_duration
            .iter()
            .enumerate()
            .map(|(hour, &v)| [hour as f64, v])
            .collect();

        Plot::new("durationChart")
            .legend(Legend::default())
            .x_axis_formatter(hour_formatter(self.labels.clone()))
            .height(220.0)
            .x_axis_label("Hora del día")
            .y_axis_label("Segundos")
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                plot_ui.line(
                    Line::new(points)
                        .name("Duración media (s)")
                        .color(Color32::from_rgb(75, 192, 192))
                        .width(2.0),
                );
            });
    }
}

/// Dueño de las dos gráficas. Cada `render` descarta las anteriores antes de crear las nuevas.
#[derive(Debug, Default)]
pub struct ChartRenderer {
    trips_chart: Option<HourlyTripsChart>,
    duration_chart: Option<DurationChart>,
    renders: usize,
}

impl ChartRenderer {
    pub fn render(&mut self, hist: &HourlyHistograms, avg_duration: &[f64; HOURS]) {
        self.destroy();

        let labels = hour_labels();
        self.trips_chart = Some(HourlyTripsChart {
            labels: labels.clone(),
            total: as_series(&hist.by_hour),
            morning: as_series(&hist.morning_rush),
            evening: as_series(&hist.evening_rush),
        });
        self.duration_chart = Some(DurationChart {
            labels,
            avg_duration: avg_duration.to_vec(),
        });
        self.renders += 1;
    }

    pub fn destroy(&mut self) {
        self.trips_chart = None;
        self.duration_chart = None;
    }

    pub fn live_charts(&self) -> usize {
        self.trips_chart.is_some() as usize + self.duration_chart.is_some() as usize
    }

    pub fn renders(&self) -> usize {
        self.renders
    }

    pub fn duration_chart(&self) -> Option<&DurationChart> {
        self.duration_chart.as_ref()
    }

    pub fn show(&self, ui: &mut egui::Ui) {
        ui.columns(2, |cols| {
            cols[0].strong("Viajes por hora");
            match &self.trips_chart {
                Some(chart) => chart.show(&mut cols[0]),
                None => {
                    cols[0].label(egui::RichText::new("Sin datos").italics().weak());
                }
            }

            cols[1].strong("Duración media por hora");
            match &self.duration_chart {
                Some(chart) => chart.show(&mut cols[1]),
                None => {
                    cols[1].label(egui::RichText::new("Sin datos").italics().weak());
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_replaces_instead_of_accumulating() {
        let mut renderer = ChartRenderer::default();
        assert_eq!(renderer.live_charts(), 0);

        let mut hist = HourlyHistograms::default();
        for _ in 0..3 {
            renderer.render(&hist, &[0.0; HOURS]);
            assert_eq!(renderer.live_charts(), 2);
        }
        assert_eq!(renderer.renders(), 3);

        hist.by_hour[9] = 4;
        hist.morning_rush[9] = 1;
        let mut avg = [0.0; HOURS];
        avg[9] = 612.5;
        renderer.render(&hist, &avg);

        let trips = renderer.trips_chart.as_ref().unwrap();
        assert_eq!(trips.labels.len(), HOURS);
        assert_eq!(trips.labels[9], "9:00");
        assert_eq!(trips.total[9], 4.0);
        assert_eq!(trips.morning[9], 1.0);
        assert_eq!(trips.evening.iter().sum::<f64>(), 0.0);
        assert_eq!(renderer.duration_chart().unwrap().avg_duration[9], 612.5);
    }

    #[test]
    fn test_destroy() {
        let mut renderer = ChartRenderer::default();
        renderer.render(&HourlyHistograms::default(), &[0.0; HOURS]);
        renderer.destroy();
        assert_eq!(renderer.live_charts(), 0);
        assert!(renderer.trips_chart.is_none());
    }

    #[test]
    fn test_grouped_bars_are_offset() {
        let values = vec![1.0; HOURS];
        let left = bars(&values, -BAR_WIDTH);
        assert_eq!(left.len(), HOURS);
        assert!((left[0].argument + BAR_WIDTH).abs() < 1e-12);
        assert_eq!(left[5].value, 1.0);
    }

    #[test]
    fn test_hour_formatter_only_labels_whole_hours() {
        let fmt = hour_formatter(hour_labels());
        let range = 0.0..=23.0;
        let mark = |value| GridMark { value, step_size: 1.0 };
        assert_eq!(fmt(mark(17.0), &range), "17:00");
        assert_eq!(fmt(mark(2.5), &range), "");
        assert_eq!(fmt(mark(24.0), &range), "");
        assert_eq!(fmt(mark(-1.0), &range), "");
    }
}
