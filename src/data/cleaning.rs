//! Limpieza del CSV crudo de viajes (formato `train.csv` de NYC) a registros que el tablero
//! puede cargar directamente.
//!
//! Pasos: duplicados, campos obligatorios, fechas, campos derivados (duración, distancia
//! haversine, velocidad, hora, día), exclusión de registros inválidos con su motivo y
//! normalización z-score de las coordenadas.

use crate::error::Result;
use chrono::{Datelike, NaiveDateTime, Timelike};
use csv::{ReaderBuilder, WriterBuilder};
use log::info;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

const EARTH_RADIUS_KM: f64 = 6371.0;
const MAX_SPEED_KMPH: f64 = 120.0;
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const CLEAN_HEADER: [&str; 19] = [
    "trip_id",
    "vendor_id",
    "pickup_datetime",
    "dropoff_datetime",
    "passenger_count",
    "store_and_fwd_flag",
    "pickup_longitude",
    "pickup_latitude",
    "dropoff_longitude",
    "dropoff_latitude",
    "trip_duration",
    "trip_distance_km",
    "speed_kmph",
    "pickup_hour",
    "pickup_dayofweek",
    "pickup_longitude_z",
    "pickup_latitude_z",
    "dropoff_longitude_z",
    "dropoff_latitude_z",
];

const EXCLUDED_HEADER: [&str; 16] = [
    "trip_id",
    "vendor_id",
    "pickup_datetime",
    "dropoff_datetime",
    "passenger_count",
    "store_and_fwd_flag",
    "pickup_longitude",
    "pickup_latitude",
    "dropoff_longitude",
    "dropoff_latitude",
    "trip_duration",
    "trip_distance_km",
    "speed_kmph",
    "pickup_hour",
    "pickup_dayofweek",
    "exclude_reason",
];

#[derive(Debug, Deserialize)]
struct RawTrip {
    #[serde(default)]
    id: String,
    #[serde(default)]
    vendor_id: String,
    #[serde(default)]
    pickup_datetime: String,
    #[serde(default)]
    dropoff_datetime: String,
    #[serde(default)]
    passenger_count: String,
    #[serde(default)]
    pickup_longitude: String,
    #[serde(default)]
    pickup_latitude: String,
    #[serde(default)]
    dropoff_longitude: String,
    #[serde(default)]
    dropoff_latitude: String,
    #[serde(default)]
    store_and_fwd_flag: String,
}

#[derive(Debug, Clone)]
struct DerivedTrip {
    trip_id: String,
    vendor_id: String,
    pickup_datetime: String,
    dropoff_datetime: String,
    passenger_count: String,
    store_and_fwd_flag: String,
    pickup_longitude: f64,
    pickup_latitude: f64,
    dropoff_longitude: f64,
    dropoff_latitude: f64,
    trip_duration: f64,
    trip_distance_km: f64,
    speed_kmph: Option<f64>,
    pickup_hour: u32,
    pickup_dayofweek: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExcludeReason {
    NegativeOrZeroDuration,
    ZeroOrNegativeDistance,
    UnrealisticSpeed,
    ExtremeCoords,
}

impl ExcludeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExcludeReason::NegativeOrZeroDuration => "negative_or_zero_duration",
            ExcludeReason::ZeroOrNegativeDistance => "zero_or_negative_distance",
            ExcludeReason::UnrealisticSpeed => "unrealistic_speed",
            ExcludeReason::ExtremeCoords => "extreme_coords",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningReport {
    pub read: usize,
    pub duplicates: usize,
    pub missing: usize,
    pub bad_timestamps: usize,
    pub excluded: usize,
    pub kept: usize,
}

/// Distancia en km entre dos puntos (lat, lon en grados).
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// (x - media) / desviación poblacional; 0 si la columna es constante.
pub fn zscores(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
    values
        .iter()
        .map(|v| if std > 0.0 { (v - mean) / std } else { 0.0 })
        .collect()
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

fn exclude_reason(trip: &DerivedTrip) -> Option<ExcludeReason> {
    if trip.trip_duration <= 0.0 {
        return Some(ExcludeReason::NegativeOrZeroDuration);
    }
    if trip.trip_distance_km <= 0.0 {
        return Some(ExcludeReason::ZeroOrNegativeDistance);
    }
    if trip.speed_kmph.is_some_and(|s| s > MAX_SPEED_KMPH) {
        return Some(ExcludeReason::UnrealisticSpeed);
    }
    if trip.pickup_latitude.abs() > 90.0
        || trip.dropoff_latitude.abs() > 90.0
        || trip.pickup_longitude.abs() > 180.0
        || trip.dropoff_longitude.abs() > 180.0
    {
        return Some(ExcludeReason::ExtremeCoords);
    }
    None
}

enum Derivation {
    Ok(DerivedTrip),
    Missing,
    BadTimestamp,
}

fn derive(raw: RawTrip) -> Derivation {
    let coord = |s: &str| s.trim().parse::<f64>().ok().filter(|v| v.is_finite());
    let required = [
        &raw.pickup_datetime,
        &raw.dropoff_datetime,
        &raw.pickup_longitude,
        &raw.pickup_latitude,
        &raw.dropoff_longitude,
        &raw.dropoff_latitude,
    ];
    if required.iter().any(|v| v.trim().is_empty()) {
        return Derivation::Missing;
    }

    let (Some(pickup_longitude), Some(pickup_latitude), Some(dropoff_longitude), Some(dropoff_latitude)) = (
        coord(raw.pickup_longitude.as_str()),
        coord(raw.pickup_latitude.as_str()),
        coord(raw.dropoff_longitude.as_str()),
        coord(raw.dropoff_latitude.as_str()),
    ) else {
        return Derivation::Missing;
    };

    let pickup = NaiveDateTime::parse_from_str(raw.pickup_datetime.trim(), DATETIME_FORMAT);
    let dropoff = NaiveDateTime::parse_from_str(raw.dropoff_datetime.trim(), DATETIME_FORMAT);
    let (Ok(pickup), Ok(dropoff)) = (pickup, dropoff) else {
        return Derivation::BadTimestamp;
    };

    let trip_duration = (dropoff - pickup).num_seconds() as f64;
    let trip_distance_km = haversine_km(pickup_latitude, pickup_longitude, dropoff_latitude, dropoff_longitude);
    let speed_kmph = if trip_duration > 0.0 {
        Some(trip_distance_km / (trip_duration / 3600.0))
    } else {
        None
    };

    Derivation::Ok(DerivedTrip {
        trip_id: raw.id,
        vendor_id: raw.vendor_id,
        pickup_datetime: raw.pickup_datetime,
        dropoff_datetime: raw.dropoff_datetime,
        passenger_count: raw.passenger_count,
        store_and_fwd_flag: raw.store_and_fwd_flag,
        pickup_longitude,
        pickup_latitude,
        dropoff_longitude,
        dropoff_latitude,
        trip_duration,
        trip_distance_km,
        speed_kmph,
        pickup_hour: pickup.hour(),
        pickup_dayofweek: pickup.weekday().num_days_from_sunday(),
    })
}

fn derived_fields(trip: &DerivedTrip) -> Vec<String> {
    vec![
        trip.trip_id.clone(),
        trip.vendor_id.clone(),
        trip.pickup_datetime.clone(),
        trip.dropoff_datetime.clone(),
        trip.passenger_count.clone(),
        trip.store_and_fwd_flag.clone(),
        trip.pickup_longitude.to_string(),
        trip.pickup_latitude.to_string(),
        trip.dropoff_longitude.to_string(),
        trip.dropoff_latitude.to_string(),
        trip.trip_duration.to_string(),
        trip.trip_distance_km.to_string(),
        trip.speed_kmph.map(|s| s.to_string()).unwrap_or_default(),
        trip.pickup_hour.to_string(),
        trip.pickup_dayofweek.to_string(),
    ]
}

fn create_parent<P: AsRef<Path>>(path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Limpia `raw_path`, escribe los viajes válidos en `clean_path` y los excluidos, con su
/// motivo, en `excluded_path`.
pub fn clean_trips_csv<P: AsRef<Path>>(
    raw_path: P,
    clean_path: P,
    excluded_path: P,
) -> Result<CleaningReport> {
    let mut report = CleaningReport::default();

    // Leer el CSV crudo con buffer grande
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(BufReader::with_capacity(64 * 1024, File::open(raw_path.as_ref())?));
    let headers = rdr.headers()?.clone();

    let mut seen: HashSet<String> = HashSet::new();
    let mut kept: Vec<DerivedTrip> = Vec::new();
    let mut excluded: Vec<(DerivedTrip, ExcludeReason)> = Vec::new();

    for result in rdr.records() {
        let record = result?;
        report.read += 1;

        // Filas idénticas cuentan una sola vez
        let key = record.iter().collect::<Vec<_>>().join("\u{1f}");
        if !seen.insert(key) {
            report.duplicates += 1;
            continue;
        }

        // Derivar campos y clasificar: incompleto, fecha inválida, excluido o válido
        let raw: RawTrip = record.deserialize(Some(&headers))?;
        match derive(raw) {
            Derivation::Missing => report.missing += 1,
            Derivation::BadTimestamp => report.bad_timestamps += 1,
            Derivation::Ok(trip) => match exclude_reason(&trip) {
                Some(reason) => excluded.push((trip, reason)),
                None => kept.push(trip),
            },
        }
    }

    report.excluded = excluded.len();
    report.kept = kept.len();

    // Log de excluidos, con encabezado aunque esté vacío
    create_parent(excluded_path.as_ref())?;
    let mut log_writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(File::create(excluded_path.as_ref())?));
    log_writer.write_record(EXCLUDED_HEADER)?;
    for (trip, reason) in &excluded {
        let mut fields = derived_fields(trip);
        fields.push(reason.as_str().to_string());
        log_writer.write_record(&fields)?;
    }
    log_writer.flush()?;

    // Z-scores calculados solo sobre los viajes válidos
    let z_pickup_lon = zscores(&kept.iter().map(|t| t.pickup_longitude).collect::<Vec<_>>());
    let z_pickup_lat = zscores(&kept.iter().map(|t| t.pickup_latitude).collect::<Vec<_>>());
    let z_dropoff_lon = zscores(&kept.iter().map(|t| t.dropoff_longitude).collect::<Vec<_>>());
    let z_dropoff_lat = zscores(&kept.iter().map(|t| t.dropoff_latitude).collect::<Vec<_>>());

    // Escribir el CSV limpio
    create_parent(clean_path.as_ref())?;
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(File::create(clean_path.as_ref())?));
    writer.write_record(CLEAN_HEADER)?;
    for (i, trip) in kept.iter_mut().enumerate() {
        trip.trip_distance_km = round_to(trip.trip_distance_km, 5);
        trip.speed_kmph = trip.speed_kmph.map(|s| round_to(s, 3));

        let mut fields = derived_fields(trip);
        fields.push(z_pickup_lon[i].to_string());
        fields.push(z_pickup_lat[i].to_string());
        fields.push(z_dropoff_lon[i].to_string());
        fields.push(z_dropoff_lat[i].to_string());
        writer.write_record(&fields)?;
    }
    writer.flush()?;

    info!(
        "Limpieza: {} leídos, {} duplicados, {} incompletos, {} fechas inválidas, {} excluidos, {} válidos",
        report.read, report.duplicates, report.missing, report.bad_timestamps, report.excluded, report.kept
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::data_lector::read_trips_file;

    const RAW_HEADER: &str = "id,vendor_id,pickup_datetime,dropoff_datetime,passenger_count,pickup_longitude,pickup_latitude,dropoff_longitude,dropoff_latitude,store_and_fwd_flag";

    #[test]
    fn test_haversine_known_distance() {
        // Times Square -> Empire State, ~1.1 km
        let d = haversine_km(40.7580, -73.9855, 40.7484, -73.9857);
        assert!((d - 1.07).abs() < 0.02, "distancia {}", d);
        assert_eq!(haversine_km(40.0, -73.0, 40.0, -73.0), 0.0);
    }

    #[test]
    fn test_zscores() {
        let z = zscores(&[1.0, 2.0, 3.0]);
        assert!((z[0] + 1.2247).abs() < 1e-3);
        assert!(z[1].abs() < 1e-12);
        assert_eq!(zscores(&[5.0, 5.0]), vec![0.0, 0.0]);
        assert!(zscores(&[]).is_empty());
    }

    #[test]
    fn test_clean_trips_csv() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("train.csv");
        let clean = dir.path().join("processed/cleaned_train.csv");
        let log = dir.path().join("logs/excluded_records.log");

        let rows = [
            RAW_HEADER,
            // válido, lunes 17h
            "id1,2,2016-03-14 17:24:55,2016-03-14 17:32:30,1,-73.982155,40.767937,-73.964630,40.765602,N",
            // duplicado exacto
            "id1,2,2016-03-14 17:24:55,2016-03-14 17:32:30,1,-73.982155,40.767937,-73.964630,40.765602,N",
            // válido, domingo 0h
            "id2,1,2016-06-12 00:43:35,2016-06-12 00:54:38,1,-73.980415,40.738564,-73.999481,40.731152,N",
            // duración cero
            "id3,1,2016-06-12 00:43:35,2016-06-12 00:43:35,1,-73.980415,40.738564,-73.999481,40.731152,N",
            // mismo punto
            "id4,2,2016-01-19 11:35:24,2016-01-19 12:10:48,1,-73.979027,40.763939,-73.979027,40.763939,N",
            // demasiado rápido
            "id5,2,2016-01-19 11:35:24,2016-01-19 11:35:34,1,-73.979027,40.763939,-73.005055,40.710087,N",
            // sin coordenada
            "id6,2,2016-01-19 11:35:24,2016-01-19 11:40:00,1,,40.763939,-73.005055,40.710087,N",
            // fecha ilegible
            "id7,2,ayer,2016-01-19 11:40:00,1,-73.979027,40.763939,-73.005055,40.710087,N",
        ];
        std::fs::write(&raw, rows.join("\n")).unwrap();

        let report = clean_trips_csv(&raw, &clean, &log).unwrap();
        assert_eq!(
            report,
            CleaningReport {
                read: 8,
                duplicates: 1,
                missing: 1,
                bad_timestamps: 1,
                excluded: 3,
                kept: 2,
            }
        );

        let log_text = std::fs::read_to_string(&log).unwrap();
        assert!(log_text.contains("id3") && log_text.contains("negative_or_zero_duration"));
        assert!(log_text.contains("id4") && log_text.contains("zero_or_negative_distance"));
        assert!(log_text.contains("id5") && log_text.contains("unrealistic_speed"));

        let trips = read_trips_file(&clean).unwrap();
        assert_eq!(trips.len(), 2);
        assert_eq!(trips[0].trip_id, "id1");
        assert_eq!(trips[0].trip_duration, 455.0);
        assert_eq!(trips[0].pickup_hour, 17.0);
        assert_eq!(trips[0].pickup_dayofweek, 1.0);
        assert!(trips[0].trip_distance_km > 1.0 && trips[0].trip_distance_km < 2.0);
        assert_eq!(trips[1].pickup_dayofweek, 0.0);
        assert!(trips[1].extra.contains_key("pickup_latitude_z"));
    }

    #[test]
    fn test_empty_log_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("train.csv");
        let clean = dir.path().join("clean.csv");
        let log = dir.path().join("excluded.log");
        std::fs::write(&raw, RAW_HEADER).unwrap();

        let report = clean_trips_csv(&raw, &clean, &log).unwrap();
        assert_eq!(report.kept, 0);
        let log_text = std::fs::read_to_string(&log).unwrap();
        assert!(log_text.starts_with("trip_id,") && log_text.trim_end().ends_with("exclude_reason"));
    }
}
