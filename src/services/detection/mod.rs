// Detection Pipeline
// Pairwise comparison, match aggregation, scoring and derived views.

pub mod engine;
pub mod lexical;
pub mod matcher;
pub mod scoring;
pub mod semantic;
pub mod views;

pub use engine::{PlagiarismEngine, ReportStamp};
