//! # Demo Board
//!
//! A fixed sample board used when no API key is configured or `--demo` is passed.
//! It exercises every status-line policy: on time, delayed, cancelled, and a
//! service with no calling points, followed by empty slots.

use crate::{ServiceRecord, ServiceStore};

fn record(
    scheduled: &str,
    estimated: &str,
    destination: &str,
    stops: &[&str],
    cancelled: bool,
) -> ServiceRecord {
    ServiceRecord {
        scheduled: scheduled.to_string(),
        estimated: estimated.to_string(),
        destination: destination.to_string(),
        calling_points: stops.iter().map(|s| s.to_string()).collect(),
        cancelled,
    }
}

/// Sample departures from Haddenham & Thame Parkway.
pub fn sample_board() -> ServiceStore {
    ServiceStore::from_records(vec![
        record(
            "14:32",
            "On time",
            "London Marylebone",
            &[
                "Princes Risborough",
                "Saunderton",
                "High Wycombe",
                "Beaconsfield",
                "Gerrards Cross",
                "London Marylebone",
            ],
            false,
        ),
        record(
            "14:47",
            "14:53",
            "London Marylebone",
            &["Princes Risborough", "High Wycombe", "London Marylebone"],
            false,
        ),
        record(
            "15:02",
            "Cancelled",
            "London Marylebone",
            &["High Wycombe", "London Marylebone"],
            true,
        ),
        record("15:17", "On time", "London Marylebone", &[], false),
    ])
}
