//! Shared test mocks and utilities for the Ledgerbank services.

mod bus;
mod clock;
mod repository;

pub use bus::{FlakyEventBus, RecordingEventBus};
pub use clock::FixedClock;
pub use repository::{EmptyEventRepository, FailingEventRepository, RecordingEventRepository};
