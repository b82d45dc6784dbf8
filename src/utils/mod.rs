//! Utility modules: logger, query log capture.
pub mod devlog;
pub mod logger;
