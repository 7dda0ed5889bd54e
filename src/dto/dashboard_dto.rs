use serde::Deserialize;

// ?days= de las alertas de vencimiento
#[derive(Debug, Default, Deserialize)]
pub struct AlertsQuery {
    pub days: Option<i64>,
}
