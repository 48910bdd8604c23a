//! # pubkv Testing
//!
//! Fixtures shared by the integration tests: callback recorders, fault
//! injecting store wrappers and ready-made factories over in-memory stores.

pub mod fault_injection;
pub mod fixtures;
pub mod recorder;

pub use fault_injection::FaultyStore;
pub use fixtures::{init_test_logging, memory_factory, sentinel_factory, wait_until};
pub use recorder::CallbackRecorder;
