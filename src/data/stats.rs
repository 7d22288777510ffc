use super::trip_struct::Trip;

pub const HOURS: usize = 24;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Summary {
    pub count: usize,
    pub avg_duration_sec: f64,
    pub modal_passenger_count: f64,
}

impl Summary {
    pub fn avg_duration_text(&self) -> String {
        format!("{:.1}", self.avg_duration_sec)
    }

    pub fn modal_passenger_text(&self) -> String {
        format!("{}", self.modal_passenger_count)
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Valor de pasajeros más frecuente. Empates: gana el primero que alcanzó el máximo.
pub fn modal_passenger_count(trips: &[Trip]) -> f64 {
    // orden de aparición; hay pocos valores distintos
    let mut tally: Vec<(f64, usize)> = Vec::new();
    for trip in trips {
        match tally.iter_mut().find(|(value, _)| *value == trip.passenger_count) {
            Some((_, count)) => *count += 1,
            None => tally.push((trip.passenger_count, 1)),
        }
    }

    tally
        .into_iter()
        .fold((0.0, 0), |best, (value, count)| {
            if count > best.1 { (value, count) } else { best }
        })
        .0
}

pub fn summarize(trips: &[Trip]) -> Summary {
    let count = trips.len();
    let avg_duration_sec = if count == 0 {
        0.0
    } else {
        trips.iter().map(|t| t.trip_duration).sum::<f64>() / count as f64
    };

    Summary {
        count,
        avg_duration_sec,
        modal_passenger_count: modal_passenger_count(trips),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyHistograms {
    pub by_hour: [usize; HOURS],
    pub morning_rush: [usize; HOURS],
    pub evening_rush: [usize; HOURS],
}

impl Default for HourlyHistograms {
    fn default() -> Self {
        Self {
            by_hour: [0; HOURS],
            morning_rush: [0; HOURS],
            evening_rush: [0; HOURS],
        }
    }
}

pub fn hourly_histograms(trips: &[Trip]) -> HourlyHistograms {
    let mut hist = HourlyHistograms::default();

    for trip in trips {
        let Some(hour) = trip.hour_bucket() else {
            continue;
        };
        hist.by_hour[hour] += 1;

        if trip.is_weekday() {
            match hour {
                8..=10 => hist.morning_rush[hour] += 1,
                17..=19 => hist.evening_rush[hour] += 1,
                _ => {}
            }
        }
    }

    hist
}

/// Duración media por hora, con un decimal. 0 en horas sin viajes.
pub fn avg_duration_by_hour(trips: &[Trip]) -> [f64; HOURS] {
    let mut totals = [0.0f64; HOURS];
    let mut counts = [0usize; HOURS];

    for trip in trips {
        if let Some(hour) = trip.hour_bucket() {
            totals[hour] += trip.trip_duration;
            counts[hour] += 1;
        }
    }

    let mut averages = [0.0f64; HOURS];
    for hour in 0..HOURS {
        if counts[hour] > 0 {
            averages[hour] = round1(totals[hour] / counts[hour] as f64);
        }
    }
    averages
}
