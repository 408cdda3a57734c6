//! # Paging Engine
//!
//! Owns the board cursors and cycles through the services two at a time.
//!
//! ## States
//!
//! - **Holding**: the primary service's status line is static (delay, cancellation
//!   or the start of the "Calling at:" list) for `hold_ticks` ticks
//! - **Scrolling**: the calling-point list scrolls one character per tick until it
//!   has moved through its own length, then the next service becomes primary
//!
//! The cycle never terminates. A board refresh puts the engine back to Holding on
//! the first service.

use crate::{ServiceStore, CAPACITY};
use log::debug;

/// Default number of ticks the status line is held before scrolling.
pub const DEFAULT_HOLD_TICKS: u32 = 6;

/// Highest index the primary row may take; the next row is one below it.
pub const MAX_VIEW_INDEX: usize = CAPACITY.saturating_sub(2);

/// Which half of the cycle the primary service is in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Holding,
    Scrolling,
}

/// Cursor state read by the renderer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardState {
    /// Index of the primary (top) service; `view_index + 1` is shown as next
    pub view_index: usize,
    /// Character offset into the doubled calling-point text
    pub scroll_offset: usize,
    /// Ticks spent in the current Holding phase
    pub blink_counter: u32,
    /// True while the status line is held static
    pub delay_phase: bool,
}

impl Default for BoardState {
    fn default() -> Self {
        Self {
            view_index: 0,
            scroll_offset: 0,
            blink_counter: 0,
            delay_phase: true,
        }
    }
}

impl BoardState {
    pub fn phase(&self) -> Phase {
        if self.delay_phase {
            Phase::Holding
        } else {
            Phase::Scrolling
        }
    }
}

/// Tick-driven state machine over a [`ServiceStore`].
///
/// # Example
/// ```
/// use departure_board_lib::paging::{PagingEngine, Phase};
/// use departure_board_lib::ServiceStore;
///
/// let store = ServiceStore::new();
/// let mut engine = PagingEngine::new(2);
/// engine.advance(&store);
/// engine.advance(&store);
/// assert_eq!(engine.state().phase(), Phase::Scrolling);
/// ```
#[derive(Clone, Debug)]
pub struct PagingEngine {
    state: BoardState,
    hold_ticks: u32,
}

impl Default for PagingEngine {
    fn default() -> Self {
        Self::new(DEFAULT_HOLD_TICKS)
    }
}

impl PagingEngine {
    pub fn new(hold_ticks: u32) -> Self {
        Self {
            state: BoardState::default(),
            hold_ticks: hold_ticks.max(1),
        }
    }

    pub fn state(&self) -> &BoardState {
        &self.state
    }

    /// Move the cycle forward by one tick.
    pub fn advance(&mut self, store: &ServiceStore) {
        let state = &mut self.state;

        if state.delay_phase {
            state.blink_counter += 1;
            if state.blink_counter >= self.hold_ticks {
                state.blink_counter = 0;
                state.delay_phase = false;
                debug!("view {}: holding -> scrolling", state.view_index);
            }
            return;
        }

        state.scroll_offset += 1;
        let scroll_len = store
            .get(state.view_index)
            .map_or(0, |service| service.scroll_len());

        if state.scroll_offset >= scroll_len {
            let mut next = state.view_index + 1;
            // Wrap at the last pair, and as soon as the board runs out of services
            if next > MAX_VIEW_INDEX || store.get(next).is_none() {
                next = 0;
            }
            debug!("view {} -> {} after {} chars", state.view_index, next, scroll_len);
            state.view_index = next;
            state.scroll_offset = 0;
            state.blink_counter = 0;
            state.delay_phase = true;
        }
    }

    /// Full-board refresh: back to Holding on the first service.
    pub fn reset(&mut self) {
        self.state = BoardState::default();
        debug!("board refreshed, paging reset");
    }
}
