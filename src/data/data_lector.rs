use super::trip_struct::{Trip, normalize_trips};
use crate::app::Command;
use crate::config::{DashboardConfig, TripSource};
use crate::error::{DashboardError, Result};
use log::{error, info};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

/// GET {base}/trips, espera un arreglo JSON.
pub fn fetch_trips(base_url: &str, timeout: Duration) -> Result<Vec<Trip>> {
    let url = format!("{}/trips", base_url.trim_end_matches('/'));
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()?;

    let response = client.get(&url).send()?;
    let status = response.status();
    if !status.is_success() {
        return Err(DashboardError::Status {
            url,
            status: status.as_u16(),
        });
    }

    let raw: Vec<Value> = response.json()?;
    Ok(normalize_trips(raw))
}

/// Lee viajes de un archivo local: `.json` con el mismo arreglo del servidor, o un CSV con encabezados.
pub fn read_trips_file<P: AsRef<Path>>(path: P) -> Result<Vec<Trip>> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        let reader = BufReader::new(File::open(path)?);
        let raw: Vec<Value> = serde_json::from_reader(reader)?;
        return Ok(normalize_trips(raw));
    }

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(BufReader::with_capacity(64 * 1024, File::open(path)?));
    let headers = rdr.headers()?.clone();

    let mut raw = Vec::new();
    for result in rdr.records() {
        let record = result?;
        // cada fila pasa por la misma conversión que el JSON
        let row: Map<String, Value> = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.to_string(), Value::String(v.to_string())))
            .collect();
        raw.push(Value::Object(row));
    }

    Ok(normalize_trips(raw))
}

pub fn load_trips(source: &TripSource, timeout: Duration) -> Result<Vec<Trip>> {
    match source {
        TripSource::Http { base_url } => fetch_trips(base_url, timeout),
        TripSource::File(path) => read_trips_file(path),
    }
}

/// Cargas en curso. El indicador de carga sigue activo mientras quede alguna sin terminar.
#[derive(Debug, Clone, Default)]
pub struct PendingLoads(Arc<AtomicUsize>);

impl PendingLoads {
    pub fn start(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn finish(&self) {
        // nunca por debajo de cero
        let _ = self
            .0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    pub fn is_loading(&self) -> bool {
        self.0.load(Ordering::SeqCst) > 0
    }
}

/// Carga en un hilo aparte. Si falla solo queda en el log y el tablero sigue vacío.
pub fn spawn_load<F>(config: &DashboardConfig, tx: Sender<Command>, on_done: F)
where
    F: FnOnce() + Send + 'static,
{
    let source = config.source.clone();
    let timeout = config.request_timeout;

    thread::spawn(move || {
        match load_trips(&source, timeout) {
            Ok(trips) => {
                info!("Cargados {} viajes desde {}", trips.len(), source.describe());
                // si la ventana ya se cerró no hay a quién avisar
                let _ = tx.send(Command::TripsLoaded(trips));
            }
            Err(e) => {
                error!("No se pudieron cargar los viajes desde {}: {}", source.describe(), e);
            }
        }
        on_done();
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;

    /// Servidor de una sola petición que responde `status` con `body`.
    fn serve_once(status: &str, body: &str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 4096];
            let n = stream.read(&mut buf).unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            stream.write_all(response.as_bytes()).unwrap();
            request
        });

        (format!("http://{}", addr), handle)
    }

    #[test]
    fn test_fetch_trips_normalizes_fields() {
        let body = r#"[
            {"trip_id": 1, "trip_distance_km": "5.0", "speed_kmph": 20, "trip_duration": 600,
             "pickup_hour": 9, "pickup_dayofweek": 2, "passenger_count": "1", "vendor_id": 2},
            {"trip_id": 2, "trip_distance_km": null, "pickup_hour": "x"}
        ]"#;
        let (base, server) = serve_once("200 OK", body);

        let trips = fetch_trips(&format!("{}/", base), Duration::from_secs(5)).unwrap();
        let request = server.join().unwrap();

        assert!(request.starts_with("GET /trips "));
        assert_eq!(trips.len(), 2);
        assert_eq!(trips[0].trip_distance_km, 5.0);
        assert_eq!(trips[0].passenger_count, 1.0);
        assert_eq!(trips[1].trip_distance_km, 0.0);
        assert_eq!(trips[1].pickup_hour, 0.0);
    }

    #[test]
    fn test_fetch_trips_rejects_error_status() {
        let (base, server) = serve_once("500 Internal Server Error", "[]");
        let result = fetch_trips(&base, Duration::from_secs(5));
        server.join().unwrap();
        assert!(matches!(result, Err(DashboardError::Status { status: 500, .. })));
    }

    #[test]
    fn test_fetch_trips_rejects_non_array() {
        let (base, server) = serve_once("200 OK", r#"{"trips": []}"#);
        let result = fetch_trips(&base, Duration::from_secs(5));
        server.join().unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn test_read_trips_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cleaned.csv");
        std::fs::write(
            &path,
            "trip_id,vendor_id,trip_duration,trip_distance_km,speed_kmph,pickup_hour,pickup_dayofweek,passenger_count\n\
             id1,2,455,1.49854,11.856,17,1,1\n\
             id2,1,,abc,3.2,0,0,6\n",
        )
        .unwrap();

        let trips = read_trips_file(&path).unwrap();
        assert_eq!(trips.len(), 2);
        assert_eq!(trips[0].trip_id, "id1");
        assert_eq!(trips[0].pickup_hour, 17.0);
        assert_eq!(trips[1].trip_duration, 0.0);
        assert_eq!(trips[1].trip_distance_km, 0.0);
        assert_eq!(trips[1].passenger_count, 6.0);
        assert_eq!(trips[1].extra.get("vendor_id"), Some(&Value::String("1".into())));
    }

    #[test]
    fn test_read_trips_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trips.json");
        std::fs::write(&path, r#"[{"trip_id": "a", "trip_duration": 300}]"#).unwrap();

        let trips = read_trips_file(&path).unwrap();
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].trip_duration, 300.0);
    }

    #[test]
    fn test_spawn_load_failure_sends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig {
            source: TripSource::File(dir.path().join("no_existe.csv")),
            ..DashboardConfig::default()
        };
        let (tx, rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();

        spawn_load(&config, tx, move || {
            done_tx.send(()).unwrap();
        });

        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_pending_loads_overlap() {
        let pending = PendingLoads::default();
        assert!(!pending.is_loading());

        pending.start();
        pending.start();
        pending.finish();
        assert!(pending.is_loading());

        pending.finish();
        assert!(!pending.is_loading());
        pending.finish();
        assert!(!pending.is_loading());
    }

    #[test]
    fn test_first_load_finishing_keeps_indicator() {
        let dir = tempfile::tempdir().unwrap();
        let config = DashboardConfig {
            source: TripSource::File(dir.path().join("no_existe.csv")),
            ..DashboardConfig::default()
        };
        let pending = PendingLoads::default();
        let (tx, _rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel();

        // segunda carga todavía en curso
        pending.start();

        pending.start();
        let tracker = pending.clone();
        spawn_load(&config, tx, move || {
            tracker.finish();
            done_tx.send(()).unwrap();
        });

        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(pending.is_loading());
        pending.finish();
        assert!(!pending.is_loading());
    }

    #[test]
    fn test_spawn_load_success_sends_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trips.json");
        std::fs::write(&path, r#"[{"trip_id": "a"}, {"trip_id": "b"}]"#).unwrap();
        let config = DashboardConfig {
            source: TripSource::File(path),
            ..DashboardConfig::default()
        };
        let (tx, rx) = mpsc::channel();

        spawn_load(&config, tx, || {});

        match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
            Command::TripsLoaded(trips) => assert_eq!(trips.len(), 2),
            _ => panic!("se esperaba TripsLoaded"),
        }
    }
}
