//! # Departure Board Core Library
//!
//! This library provides the data model, paging engine and frame renderer for a
//! station departure board driven on a 256x64 monochrome OLED panel. It is designed
//! to run on small Linux boards like the Raspberry Pi Zero 2 W.
//!
//! ## Design Philosophy
//!
//! ### Fixed Capacity
//! - **Six service slots**: the board never holds more than [`CAPACITY`] departures
//! - **Explicit empty sentinel**: an unfilled slot is `None`, never a half-filled record
//! - **Wholesale refresh**: the acquisition side replaces the whole [`ServiceStore`]
//!
//! ### Tick-Driven Display
//! The driver loop calls [`paging::PagingEngine::advance`] and then
//! [`renderer::BoardRenderer::render`] every 500 ms. The engine owns all cursors;
//! the renderer is a pure function of store, state and time.
//!
//! ### Data Flow
//! 1. **Online**: Fetch LDBWS departures → parse into a [`ServiceStore`] → display
//! 2. **Demo**: Use the built-in sample board → display
//! 3. **Refresh**: every fetch attempt resets the paging cursor to the first service
//!
//! ## Core Types
//!
//! - [`ServiceRecord`]: one upcoming departure
//! - [`ServiceStore`]: the ordered, fixed-capacity board

use serde::{Deserialize, Serialize};

// Module declarations
pub mod config;
pub mod demo;
pub mod graphics;
pub mod paging;
pub mod renderer;
pub mod services;
pub mod sh1122;
pub mod surface;

/// Number of service slots on the board.
pub const CAPACITY: usize = 6;

/// Separator that follows every stop in a journey list, including the last one.
pub const LIST_SEPARATOR: &str = ", ";

/// A single upcoming departure.
///
/// Times are kept as the short display strings the feed provides
/// (e.g. `"14:32"`, `"On time"`, `"Delayed"`); the board never does
/// arithmetic on them.
///
/// # Example
/// ```
/// use departure_board_lib::ServiceRecord;
///
/// let service = ServiceRecord {
///     scheduled: "14:32".to_string(),
///     estimated: "14:40".to_string(),
///     destination: "Marylebone".to_string(),
///     calling_points: vec!["Gerrards Cross".to_string(), "Marylebone".to_string()],
///     cancelled: false,
/// };
///
/// assert!(service.is_delayed());
/// assert_eq!(service.calling_text(), "Gerrards Cross, Marylebone, ");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    /// Scheduled departure time (std)
    pub scheduled: String,
    /// Estimated departure time or status (etd)
    pub estimated: String,
    /// Destination display name
    pub destination: String,
    /// Stops in journey order
    pub calling_points: Vec<String>,
    /// True if the service has been cancelled
    pub cancelled: bool,
}

impl ServiceRecord {
    /// A service is delayed when it still runs but is not expected "On time".
    pub fn is_delayed(&self) -> bool {
        !self.cancelled && !self.estimated.trim().eq_ignore_ascii_case("on time")
    }

    /// Journey-list text: each stop followed by [`LIST_SEPARATOR`].
    ///
    /// The character count of this text is the service's scroll length.
    pub fn calling_text(&self) -> String {
        self.calling_points
            .iter()
            .fold(String::new(), |mut text, stop| {
                text.push_str(stop);
                text.push_str(LIST_SEPARATOR);
                text
            })
    }

    /// Number of characters the paging engine scrolls through for this service.
    pub fn scroll_len(&self) -> usize {
        self.calling_text().chars().count()
    }
}

/// The board: up to [`CAPACITY`] services in departure order.
///
/// Slots are `None` when there is no service to show. The store is
/// replaced in full on every refresh and only read by index afterwards.
///
/// # Example
/// ```
/// use departure_board_lib::{ServiceRecord, ServiceStore};
///
/// let store = ServiceStore::from_records(vec![ServiceRecord::default()]);
/// assert_eq!(store.len(), 1);
/// assert!(store.get(1).is_none());
/// assert!(store.get(99).is_none());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStore {
    slots: [Option<ServiceRecord>; CAPACITY],
}

impl ServiceStore {
    /// An empty board.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill slots in order; records beyond [`CAPACITY`] are dropped.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = ServiceRecord>,
    {
        let mut store = Self::new();
        for (slot, record) in store.slots.iter_mut().zip(records) {
            *slot = Some(record);
        }
        store
    }

    /// Service at `index`, or `None` for an empty or out-of-range slot.
    pub fn get(&self, index: usize) -> Option<&ServiceRecord> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Count of populated slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Populated services in departure order.
    pub fn iter(&self) -> impl Iterator<Item = &ServiceRecord> {
        self.slots.iter().flatten()
    }
}
