// src/lib.rs

//! gradewatch: change detection for student-portal grades

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
