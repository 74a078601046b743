//! Pipeline entry points for grade checking.
//!
//! - `diff`: compare a fresh snapshot with the stored one
//! - `render`: turn change events and snapshots into message text
//! - `check`: one grade/exam check cycle
//! - `monitor`: run check cycles on a timer

pub mod check;
pub mod diff;
pub mod monitor;
pub mod render;

pub use check::{CheckOutcome, CheckSession, ExamOutcome, run_check, run_exam_check};
pub use diff::{ChangeEvent, compare_and_update, diff_snapshots};
pub use monitor::{CycleReport, MonitorOptions, run_cycle, run_monitor};
pub use render::{render_changes, render_exams, render_full, render_status, render_summary};
