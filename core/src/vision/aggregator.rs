use super::analyzer::{confidence, VisionAnalyzer};
use super::types::{DisplayCapture, VisualAnalysis};

/// What came back for a single display. A failed analysis keeps its slot
/// so callers can see which displays produced nothing.
#[derive(Debug, Clone)]
pub struct DisplayAnalysisOutcome {
    pub display_index: usize,
    pub analysis: Option<VisualAnalysis>,
    pub confidence: f64,
    pub error: Option<String>,
}

impl DisplayAnalysisOutcome {
    pub fn has_elements(&self) -> bool {
        self.analysis
            .as_ref()
            .map_or(false, |a| !a.elements_found.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct MultiDisplayAnalysis {
    pub displays: Vec<DisplayAnalysisOutcome>,
    pub recommended: Option<usize>,
}

impl MultiDisplayAnalysis {
    pub fn outcome(&self, index: usize) -> Option<&DisplayAnalysisOutcome> {
        self.displays.iter().find(|o| o.display_index == index)
    }

    pub fn recommended_analysis(&self) -> Option<&VisualAnalysis> {
        self.recommended
            .and_then(|index| self.outcome(index))
            .and_then(|o| o.analysis.as_ref())
    }
}

/// Runs the analyzer over every capture. One display failing leaves the
/// others untouched.
pub async fn analyze_displays(
    analyzer: &VisionAnalyzer,
    captures: &[DisplayCapture],
    context: &str,
) -> MultiDisplayAnalysis {
    let mut displays = Vec::with_capacity(captures.len());
    for capture in captures {
        match analyzer.analyze(capture, context).await {
            Ok(analysis) => {
                let score = confidence(&analysis);
                tracing::debug!(
                    display = capture.index,
                    elements = analysis.elements_found.len(),
                    confidence = score,
                    "display analyzed"
                );
                displays.push(DisplayAnalysisOutcome {
                    display_index: capture.index,
                    analysis: Some(analysis),
                    confidence: score,
                    error: None,
                });
            }
            Err(err) => {
                tracing::warn!(display = capture.index, %err, "display analysis failed");
                displays.push(DisplayAnalysisOutcome {
                    display_index: capture.index,
                    analysis: None,
                    confidence: 0.0,
                    error: Some(err.to_string()),
                });
            }
        }
    }
    let recommended = recommend_display(&displays);
    MultiDisplayAnalysis {
        displays,
        recommended,
    }
}

/// Picks where interaction should happen: the highest-confidence display
/// that actually has elements, else the highest-confidence one of those
/// that produced any analysis at all. Equal confidence goes to the lower
/// index.
pub fn recommend_display(outcomes: &[DisplayAnalysisOutcome]) -> Option<usize> {
    best_by_confidence(outcomes.iter().filter(|o| o.has_elements()))
        .or_else(|| best_by_confidence(outcomes.iter().filter(|o| o.analysis.is_some())))
}

fn best_by_confidence<'a, I>(outcomes: I) -> Option<usize>
where
    I: Iterator<Item = &'a DisplayAnalysisOutcome>,
{
    let mut best: Option<&DisplayAnalysisOutcome> = None;
    for o in outcomes {
        let replace = match best {
            None => true,
            Some(b) => {
                o.confidence > b.confidence
                    || (o.confidence == b.confidence && o.display_index < b.display_index)
            }
        };
        if replace {
            best = Some(o);
        }
    }
    best.map(|o| o.display_index)
}

/// Remembers which display a task is working on so later steps of the
/// same task do not hop between screens. Dies with the task.
#[derive(Debug, Default)]
pub struct GroundingSession {
    pinned: Option<usize>,
}

impl GroundingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pinned(&self) -> Option<usize> {
        self.pinned
    }

    pub fn pin(&mut self, index: usize) {
        self.pinned = Some(index);
    }

    pub fn reset(&mut self) {
        self.pinned = None;
    }
}
