use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
}

impl Prediction {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.2}%)", self.label, self.confidence * 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Found,
    Empty,
    /// Left in the source folder because it could not be decoded.
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortOutcome {
    pub file_name: String,
    pub source_path: PathBuf,
    pub destination: Destination,
    pub moved_to: Option<PathBuf>,
    /// Predictions that caused a `Found` routing. Empty otherwise.
    pub matched: Vec<Prediction>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortSummary {
    pub processed: usize,
    pub found: usize,
    pub empty: usize,
    pub skipped: usize,
    /// Images present in the found folder after the run, counted from disk.
    pub found_folder_count: usize,
    pub outcomes: Vec<SortOutcome>,
}
