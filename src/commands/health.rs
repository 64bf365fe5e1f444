//! Connectivity check command.

use serde::Serialize;
use tabled::Tabled;

use tenantauth_core::config::AppConfig;
use tenantauth_core::error::AppError;

use crate::output::Printer;

#[derive(Debug, Serialize, Tabled)]
struct HealthRow {
    component: &'static str,
    status: String,
}

impl HealthRow {
    fn check(component: &'static str, result: Result<(), AppError>) -> Self {
        let status = match result {
            Ok(()) => "ok".to_string(),
            Err(e) => format!("unavailable ({})", e.message),
        };
        Self { component, status }
    }

    fn is_failure(&self) -> bool {
        self.status.starts_with("unavailable")
    }
}

/// Ping the database and the counter store
pub async fn execute(config: &AppConfig, out: Printer) -> Result<(), AppError> {
    let database = match super::connect_database(config).await {
        Ok(db) => db.ping().await,
        Err(e) => Err(e),
    };

    let counters = match super::connect_counters(config).await {
        Ok(Some(store)) => HealthRow::check("counter_store", store.ping().await),
        Ok(None) => HealthRow {
            component: "counter_store",
            status: "disabled".to_string(),
        },
        Err(e) => HealthRow::check("counter_store", Err(e)),
    };

    let rows = [HealthRow::check("database", database), counters];
    out.rows(&rows);

    if rows.iter().any(HealthRow::is_failure) {
        return Err(AppError::unavailable("One or more components are unhealthy"));
    }
    Ok(())
}
