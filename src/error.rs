use thiserror::Error;

/// Errores del tablero de viajes.
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("fallo de red: {0}")]
    Http(#[from] reqwest::Error),
    #[error("el servidor respondió {status} para {url}")]
    Status { url: String, status: u16 },
    #[error("JSON inválido: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV inválido: {0}")]
    Csv(#[from] csv::Error),
    #[error("error de archivo: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuración inválida: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
