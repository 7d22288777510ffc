use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub trip_id: String,
    pub trip_distance_km: f64,
    pub speed_kmph: f64,
    pub trip_duration: f64,
    pub pickup_hour: f64,
    pub pickup_dayofweek: f64,
    pub passenger_count: f64,
    // pickup/dropoff, vendor_id y lo que venga del servidor
    pub extra: Map<String, Value>,
}

/// Conversión con pérdida: lo que no sea un número finito termina en 0.
pub fn coerce_number(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        Value::Bool(false) => 0.0,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse::<f64>().unwrap_or(0.0)
            }
        }
        _ => 0.0,
    };

    if n.is_finite() { n } else { 0.0 }
}

fn opaque_id(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

impl Trip {
    pub fn from_value(value: Value) -> Self {
        let mut fields = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let mut take = |name: &str| fields.remove(name).map_or(0.0, |v| coerce_number(&v));
        let trip_distance_km = take("trip_distance_km");
        let speed_kmph = take("speed_kmph");
        let trip_duration = take("trip_duration");
        let pickup_hour = take("pickup_hour");
        let pickup_dayofweek = take("pickup_dayofweek");
        let passenger_count = take("passenger_count");
        let trip_id = opaque_id(fields.remove("trip_id").as_ref());

        Trip {
            trip_id,
            trip_distance_km,
            speed_kmph,
            trip_duration,
            pickup_hour,
            pickup_dayofweek,
            passenger_count,
            extra: fields,
        }
    }

    /// Valor numérico de cualquier campo por nombre, 0 si no existe.
    pub fn field(&self, name: &str) -> f64 {
        match name {
            "trip_distance_km" => self.trip_distance_km,
            "speed_kmph" => self.speed_kmph,
            "trip_duration" => self.trip_duration,
            "pickup_hour" => self.pickup_hour,
            "pickup_dayofweek" => self.pickup_dayofweek,
            "passenger_count" => self.passenger_count,
            "trip_id" => coerce_number(&Value::String(self.trip_id.clone())),
            other => self.extra.get(other).map_or(0.0, coerce_number),
        }
    }

    /// Hora como índice 0..24 si es un entero válido.
    pub fn hour_bucket(&self) -> Option<usize> {
        let h = self.pickup_hour;
        if h.fract() == 0.0 && (0.0..24.0).contains(&h) {
            Some(h as usize)
        } else {
            None
        }
    }

    /// Lunes (1) a viernes (5).
    pub fn is_weekday(&self) -> bool {
        (1.0..=5.0).contains(&self.pickup_dayofweek)
    }
}

pub fn normalize_trips(values: Vec<Value>) -> Vec<Trip> {
    values.into_iter().map(Trip::from_value).collect()
}
