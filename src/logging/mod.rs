//! Structured logging subsystem.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber (format, filter, OTel bridge)
//! - Emit structured log records enriched with trace/span ids
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - error/fatal records go to stderr, everything else to stdout
//! - Log calls are safe before the subscriber is installed: they simply
//!   emit without enrichment sinks, never fail

pub mod init;
pub mod logger;
pub mod record;

pub use init::{init_logging, LoggingInitError};
pub use logger::CorrelatedLogger;
pub use record::{LogLevel, LogRecord};
