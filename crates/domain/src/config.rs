use std::env;

/// DynamoDB table names and snapshot settings, read from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreConfig {
    pub event_log_table: String,
    pub event_snapshots_table: String,
    pub orders_view_table: String,
    pub addresses_table: String,
    pub payments_table: String,
    pub pharmacies_table: String,
    pub insurances_table: String,
    pub order_numbers_table: String,
    pub snapshot_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            event_log_table: "pharmacy-event-log".to_string(),
            event_snapshots_table: "pharmacy-event-snapshots".to_string(),
            orders_view_table: "pharmacy-orders-view".to_string(),
            addresses_table: "pharmacy-addresses".to_string(),
            payments_table: "pharmacy-payments".to_string(),
            pharmacies_table: "pharmacy-pharmacies".to_string(),
            insurances_table: "pharmacy-insurances".to_string(),
            order_numbers_table: "pharmacy-order-numbers".to_string(),
            snapshot_size: 5,
        }
    }
}

impl StoreConfig {
    /// Loads `.env` when present, then falls back to defaults per variable.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |key: &str, default: String| lookup(key).unwrap_or(default);

        let snapshot_size = match lookup("DYNAMODB_SNAPSHOT_SIZE").map(|raw| raw.parse::<usize>()) {
            Some(Ok(size)) if size > 0 => size,
            Some(_) => {
                tracing::warn!(
                    "Ignoring invalid DYNAMODB_SNAPSHOT_SIZE, using {}",
                    defaults.snapshot_size
                );
                defaults.snapshot_size
            }
            None => defaults.snapshot_size,
        };

        Self {
            event_log_table: var("DYNAMODB_EVENT_LOG_TABLE", defaults.event_log_table),
            event_snapshots_table: var(
                "DYNAMODB_EVENT_SNAPSHOTS_TABLE",
                defaults.event_snapshots_table,
            ),
            orders_view_table: var("DYNAMODB_ORDERS_VIEW_TABLE", defaults.orders_view_table),
            addresses_table: var("DYNAMODB_ADDRESSES_TABLE", defaults.addresses_table),
            payments_table: var("DYNAMODB_PAYMENTS_TABLE", defaults.payments_table),
            pharmacies_table: var("DYNAMODB_PHARMACIES_TABLE", defaults.pharmacies_table),
            insurances_table: var("DYNAMODB_INSURANCES_TABLE", defaults.insurances_table),
            order_numbers_table: var("DYNAMODB_ORDER_NUMBERS_TABLE", defaults.order_numbers_table),
            snapshot_size,
        }
    }
}
