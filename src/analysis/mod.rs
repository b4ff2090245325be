//! Drowsiness analysis results and normalization of raw model output
//!
//! The remote model's output format is not guaranteed, so everything it
//! returns goes through [`normalize`] before reaching a client.

mod parser;
mod result;

pub use parser::{normalize, parse_braced, parse_strict, strip_fences};
pub use result::{AnalysisResult, DrowsinessLevel};
