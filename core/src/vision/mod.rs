//! Visual grounding: screen captures go to a vision-capable model, which
//! answers with interactive elements and action recommendations; the
//! aggregator scores displays and picks one to work on.

pub mod aggregator;
pub mod analyzer;
pub mod types;

pub use aggregator::{
    analyze_displays, recommend_display, DisplayAnalysisOutcome, GroundingSession,
    MultiDisplayAnalysis,
};
pub use analyzer::{confidence, VisionAnalyzer};
pub use types::{
    ActionRecommendation, DisplayCapture, Region, ScreenInfo, VisualAnalysis, VisualElement,
};
