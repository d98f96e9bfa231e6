//! Artifacts and console reporting for finished runs

pub mod report;
pub mod writer;

pub use writer::ArtifactWriter;
