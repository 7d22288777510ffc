mod app;
mod config;
mod data;
mod error;
mod visual;

use app::{Command, DEFAULT_SORT_FIELD, Dashboard};
use config::DashboardConfig;
use data::stats::HOURS;
use std::env;
use std::error::Error;
use std::time::Instant;

fn print_usage() {
    let bin = env::args().next().unwrap_or_default();
    println!("Uso:");
    println!("  {} dashboard [url_api|archivo]", bin);
    println!("  {} summary [url_api|archivo] [campo_orden]", bin);
    println!("  {} clean <csv_crudo> <csv_salida> <log_excluidos>", bin);
    println!("\nVariables de entorno:");
    println!(
        "  {}  (por defecto {})",
        config::API_BASE_VAR,
        config::DEFAULT_API_BASE
    );
    println!(
        "  {}  (por defecto {})",
        config::TIMEOUT_VAR,
        config::DEFAULT_TIMEOUT_SECS
    );
    println!("\nEjemplos:");
    println!("  {} dashboard http://localhost:5000", bin);
    println!("  {} summary data/processed/cleaned_train.csv trip_duration", bin);
    println!(
        "  {} clean data/raw/train.csv data/processed/cleaned_train.csv logs/excluded_records.log",
        bin
    );
}

fn print_summary(dashboard: &Dashboard) {
    let summary = dashboard.summary();
    println!("\nResumen:");
    println!("  - Total de viajes: {}", summary.count);
    println!("  - Duración media: {} s", summary.avg_duration_text());
    println!(
        "  - Pasajeros más comunes: {}",
        summary.modal_passenger_text()
    );

    let hist = dashboard.histograms();
    let avg = dashboard
        .charts()
        .duration_chart()
        .map(|c| c.avg_duration.clone())
        .unwrap_or_else(|| vec![0.0; HOURS]);
    println!("\n  Hora  Total  Mañana  Tarde  Duración media (s)");
    for hour in 0..HOURS {
        println!(
            "  {:>4}  {:>5}  {:>6}  {:>5}  {:>18.1}",
            hour, hist.by_hour[hour], hist.morning_rush[hour], hist.evening_rush[hour], avg[hour]
        );
    }

    println!(
        "\nTop 10 por {}:",
        visual::table::sort_label(dashboard.sort_field())
    );
    for (i, row) in dashboard.table().rows().iter().enumerate() {
        println!(
            "{:>2}. {} - {} km, {} km/h, {} s, {}h {}",
            i + 1,
            row.trip_id,
            row.distance,
            row.speed,
            row.duration,
            row.hour,
            row.weekday
        );
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    let command = &args[1];

    match command.as_str() {
        "dashboard" => {
            let config = DashboardConfig::from_env()?.with_source_arg(args.get(2).map(String::as_str));
            println!("Abriendo tablero con datos de {}", config.source.describe());
            visual::visual::run_app(config)?;
        }

        "summary" => {
            let config = DashboardConfig::from_env()?.with_source_arg(args.get(2).map(String::as_str));
            let sort_field = args.get(3).cloned().unwrap_or_else(|| DEFAULT_SORT_FIELD.to_string());

            let start_time = Instant::now();
            println!("Cargando viajes desde {}...", config.source.describe());

            let trips = data::data_lector::load_trips(&config.source, config.request_timeout)?;

            let mut dashboard = Dashboard::default();
            dashboard.dispatch(Command::TripsLoaded(trips));
            dashboard.dispatch(Command::ChangeSort(sort_field));

            println!("Carga completada en {:.2?}", start_time.elapsed());
            print_summary(&dashboard);
        }

        "clean" => {
            if args.len() < 5 {
                println!("Error: Faltan argumentos para el comando clean");
                print_usage();
                return Ok(());
            }

            let start_time = Instant::now();
            println!("Limpiando {}...", args[2]);

            let report = data::cleaning::clean_trips_csv(&args[2], &args[3], &args[4])?;

            println!("Limpieza completada en {:.2?}", start_time.elapsed());
            println!("  - Registros leídos: {}", report.read);
            println!("  - Duplicados: {}", report.duplicates);
            println!("  - Incompletos: {}", report.missing);
            println!("  - Fechas inválidas: {}", report.bad_timestamps);
            println!("  - Excluidos (ver {}): {}", args[4], report.excluded);
            println!("  - Guardados en {}: {}", args[3], report.kept);
        }

        _ => {
            println!("Comando desconocido: {}", command);
            print_usage();
        }
    }

    Ok(())
}
