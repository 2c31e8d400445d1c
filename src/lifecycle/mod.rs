//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (manager.rs, called from the service actor):
//!     toggle → directory register/unregister → flip flag → delegate callback
//!
//! Shutdown (manager.rs + shutdown.rs):
//!     Shutdown event → unregister → stop accept loop & signal watcher
//!         → drain in-flight connections → directory remove
//!         → delegate stopped → release waiters
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM/SIGQUIT → ShutdownTrigger::shutdown
//! ```
//!
//! # Design Decisions
//! - Directory failures never block a transition
//! - Shutdown is one-way and runs exactly once
//! - Drain waits for every connection unless a timeout is configured

pub mod manager;
pub mod shutdown;
pub mod signals;

pub use manager::LifecycleManager;
pub use shutdown::Shutdown;
pub use signals::spawn_signal_watcher;
