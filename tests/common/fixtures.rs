//! Record and configuration fixtures

use disconnect_sync::client::Config;
use disconnect_sync::shared::{AppConfig, Dataset, Record, SyncState, TimingSettings};
use std::time::Duration;

/// Consumer row with a status and a fixed address
pub fn consumer(id: &str, status: &str) -> Record {
    let mut record = Record::new(id).with_status(status);
    record.fields.address = format!("{} Canal Road", id.trim_start_matches('C'));
    record.fields.agency = "North Zone".to_string();
    record
}

/// `count` consumers `C1..=Ccount`, all connected
pub fn consumers(count: usize) -> Vec<Record> {
    (1..=count)
        .map(|n| consumer(&format!("C{}", n), "connected"))
        .collect()
}

pub fn pending(record: Record, state: SyncState) -> Record {
    record.with_sync_state(state)
}

pub fn dataset(records: Vec<Record>) -> Dataset {
    Dataset::from_records(records)
}

/// Configuration with no display delays and a fast retry budget
pub fn fast_config(server_url: &str) -> Config {
    let app = AppConfig::builder()
        .server_url(server_url)
        .timings(TimingSettings::immediate())
        .retry(3, Duration::from_millis(5))
        .build()
        .expect("valid test config");
    Config::from_app(app)
}
