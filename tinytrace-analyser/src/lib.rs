pub mod analyzer;
pub mod window;

pub use analyzer::{Analysis, AnalyzerError, Classification, ProximityAnalyzer};
pub use window::SlidingWindow;
