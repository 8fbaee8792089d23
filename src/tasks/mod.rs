//! Background Tasks Module
//!
//! Tasks that run periodically during server operation.
//!
//! # Tasks
//! - Cache cleanup: purges expired cache entries at the configured interval

mod cleanup;

pub use cleanup::spawn_cleanup_task;
