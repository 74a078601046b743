// src/models/mod.rs

//! Domain models for the grade watcher.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod exam;
mod grades;

// Re-export all public types
pub use config::{
    Config, LoggingConfig, MonitorConfig, PortalConfig, StorageConfig, TelegramConfig,
};
pub use exam::Exam;
pub use grades::{Course, GradeComponent, Snapshot};
