use crate::data::filters::{self, FilterParams};
use crate::data::stats::{self, HourlyHistograms, Summary};
use crate::data::trip_struct::Trip;
use crate::visual::charts::ChartRenderer;
use crate::visual::table::TopTripsTable;
use log::debug;

pub const DEFAULT_SORT_FIELD: &str = "trip_distance_km";

/// Acciones de la interfaz (y del cargador) que cambian el tablero.
pub enum Command {
    TripsLoaded(Vec<Trip>),
    ApplyFilters(FilterParams),
    ResetFilters,
    ChangeSort(String),
}

/// Todo el estado del tablero. `all_trips` solo cambia con una carga nueva; `trips` se
/// reemplaza completo en cada filtro o reset.
pub struct Dashboard {
    all_trips: Vec<Trip>,
    trips: Vec<Trip>,
    sort_field: String,
    summary: Summary,
    histograms: HourlyHistograms,
    charts: ChartRenderer,
    table: TopTripsTable,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self {
            all_trips: Vec::new(),
            trips: Vec::new(),
            sort_field: DEFAULT_SORT_FIELD.to_string(),
            summary: Summary::default(),
            histograms: HourlyHistograms::default(),
            charts: ChartRenderer::default(),
            table: TopTripsTable::default(),
        }
    }
}

impl Dashboard {
    pub fn dispatch(&mut self, command: Command) {
        match command {
            Command::TripsLoaded(trips) => {
                // Carga nueva: reemplaza todo, sin mezclar con la anterior
                debug!("Nuevo conjunto de {} viajes", trips.len());
                self.trips = filters::reset(&trips);
                self.all_trips = trips;
                self.update_dashboard();
            }
            Command::ApplyFilters(params) => {
                // Siempre desde el conjunto completo, los filtros no se acumulan
                self.trips = filters::apply_filters(&self.all_trips, &params);
                debug!(
                    "Filtro {:?}: {} de {} viajes",
                    params,
                    self.trips.len(),
                    self.all_trips.len()
                );
                self.update_dashboard();
            }
            Command::ResetFilters => {
                // Volver a todos los viajes cargados
                self.trips = filters::reset(&self.all_trips);
                self.update_dashboard();
            }
            Command::ChangeSort(field) => {
                self.sort_field = field;
                // solo la tabla, resumen y gráficas no dependen del orden
                self.table.render_top_trips(&self.trips, &self.sort_field);
            }
        }
    }

    fn update_dashboard(&mut self) {
        // Resumen e histogramas sobre el conjunto de trabajo
        self.summary = stats::summarize(&self.trips);
        self.histograms = stats::hourly_histograms(&self.trips);
        let avg_by_hour = stats::avg_duration_by_hour(&self.trips);

        // Gráficas y tabla se regeneran completas
        self.charts.render(&self.histograms, &avg_by_hour);
        debug!("Gráficas regeneradas ({})", self.charts.renders());
        self.table.render_top_trips(&self.trips, &self.sort_field);
    }

    pub fn all_trips(&self) -> &[Trip] {
        &self.all_trips
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn sort_field(&self) -> &str {
        &self.sort_field
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn histograms(&self) -> &HourlyHistograms {
        &self.histograms
    }

    pub fn charts(&self) -> &ChartRenderer {
        &self.charts
    }

    pub fn table(&self) -> &TopTripsTable {
        &self.table
    }
}
