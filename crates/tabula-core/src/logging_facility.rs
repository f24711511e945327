//! Logging for the persistence layer
//!
//! Storage operations log through the `log_op_*` macros so every crate emits
//! the field names defined in [`crate::schema`]. Binaries pick an output
//! [`Profile`] once at startup; tests read events back through
//! [`test_capture`].

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
