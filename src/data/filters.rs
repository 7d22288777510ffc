use super::trip_struct::Trip;

/// Ventana de hora pico entre semana.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeakMode {
    #[default]
    Any,
    Morning,
    Evening,
}

impl PeakMode {
    pub fn parse(value: &str) -> Self {
        match value {
            "morning" => PeakMode::Morning,
            "evening" => PeakMode::Evening,
            _ => PeakMode::Any,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PeakMode::Any => "all",
            PeakMode::Morning => "morning",
            PeakMode::Evening => "evening",
        }
    }

    /// Rango de horas (inclusivo) de la ventana.
    pub fn hours(&self) -> Option<(f64, f64)> {
        match self {
            PeakMode::Any => None,
            PeakMode::Morning => Some((8.0, 10.0)),
            PeakMode::Evening => Some((17.0, 19.0)),
        }
    }
}

pub enum TripFilter {
    Distance { min: f64, max: f64 },
    Peak(PeakMode),
    And(Vec<TripFilter>),
}

impl TripFilter {
    pub fn matches(&self, trip: &Trip) -> bool {
        match self {
            TripFilter::Distance { min, max } => {
                trip.trip_distance_km >= *min && trip.trip_distance_km <= *max
            }
            TripFilter::Peak(mode) => match mode.hours() {
                Some((from, to)) => {
                    trip.is_weekday() && trip.pickup_hour >= from && trip.pickup_hour <= to
                }
                None => true,
            },
            TripFilter::And(filters) => filters.iter().all(|filter| filter.matches(trip)),
        }
    }
}

/// Lo que el usuario pidió en el formulario de filtros.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterParams {
    pub min_distance: Option<f64>,
    pub max_distance: Option<f64>,
    pub peak: PeakMode,
}

fn parse_bound(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

impl FilterParams {
    /// Texto vacío o que no es número = sin límite.
    pub fn from_inputs(min_text: &str, max_text: &str, peak_text: &str) -> Self {
        Self {
            min_distance: parse_bound(min_text),
            max_distance: parse_bound(max_text),
            peak: PeakMode::parse(peak_text),
        }
    }

    pub fn to_filter(&self) -> TripFilter {
        TripFilter::And(vec![
            TripFilter::Distance {
                min: self.min_distance.unwrap_or(0.0),
                max: self.max_distance.unwrap_or(f64::INFINITY),
            },
            TripFilter::Peak(self.peak),
        ])
    }
}

/// Siempre parte del conjunto completo, los filtros no se acumulan.
pub fn apply_filters(all_trips: &[Trip], params: &FilterParams) -> Vec<Trip> {
    let filter = params.to_filter();
    all_trips
        .iter()
        .filter(|trip| filter.matches(trip))
        .cloned()
        .collect()
}

pub fn reset(all_trips: &[Trip]) -> Vec<Trip> {
    all_trips.to_vec()
}
