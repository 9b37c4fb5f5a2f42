//! Application services with process-scoped lifetime.
//!
//! Explicitly constructed and injected through `AppState` so tests can run
//! isolated instances.

pub mod audit;
pub mod events;

pub use audit::AuditService;
pub use events::{EventBus, RealtimeEvent};
