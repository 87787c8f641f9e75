use serde::{Deserialize, Serialize};

/// Screen-space rectangle, origin at the top-left of the display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

impl Region {
    pub fn center(&self) -> (i32, i32) {
        (
            self.x + (self.width / 2) as i32,
            self.y + (self.height / 2) as i32,
        )
    }
}

/// One interactive element the vision model located on screen. Produced
/// fresh per capture and discarded after the step that asked for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualElement {
    #[serde(rename = "type")]
    pub element_type: String,
    pub description: String,
    pub coordinates: Region,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub text_content: String,
    #[serde(default)]
    pub clickable: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreenInfo {
    #[serde(default)]
    pub resolution: String,
    #[serde(default)]
    pub active_window: String,
    #[serde(default)]
    pub display_index: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecommendation {
    pub action: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub coordinates: Option<Region>,
    #[serde(default)]
    pub reason: String,
}

/// The vision model's answer for one display. Valid only when it carries
/// at least one element or one recommendation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisualAnalysis {
    #[serde(default)]
    pub elements_found: Vec<VisualElement>,
    #[serde(default)]
    pub screen_info: ScreenInfo,
    #[serde(default)]
    pub recommendations: Vec<ActionRecommendation>,
}

impl VisualAnalysis {
    pub fn is_empty(&self) -> bool {
        self.elements_found.is_empty() && self.recommendations.is_empty()
    }

    pub fn clickable_elements(&self) -> impl Iterator<Item = &VisualElement> {
        self.elements_found.iter().filter(|e| e.clickable)
    }
}

/// Raw pixels of one display, PNG-encoded. Ephemeral: captured, analyzed,
/// dropped.
#[derive(Debug, Clone)]
pub struct DisplayCapture {
    pub index: usize,
    pub bounds: Region,
    pub image: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub is_active: bool,
}

impl DisplayCapture {
    pub fn primary(image: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            index: 0,
            bounds: Region {
                x: 0,
                y: 0,
                width,
                height,
            },
            image,
            width,
            height,
            is_active: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_center() {
        let r = Region {
            x: 10,
            y: 20,
            width: 100,
            height: 40,
        };
        assert_eq!(r.center(), (60, 40));
    }

    #[test]
    fn analysis_parses_model_payload() {
        let raw = r#"{
            "elements_found": [
                {"type": "button", "description": "OK button",
                 "coordinates": {"x": 100, "y": 200, "width": 80, "height": 30},
                 "confidence": 0.92, "text_content": "OK", "clickable": true}
            ],
            "screen_info": {"resolution": "1920x1080", "active_window": "Settings"},
            "recommendations": [
                {"action": "click", "target": "OK button", "reason": "confirms the dialog"}
            ]
        }"#;
        let analysis: VisualAnalysis = serde_json::from_str(raw).unwrap();
        assert!(!analysis.is_empty());
        assert_eq!(analysis.clickable_elements().count(), 1);
        assert_eq!(analysis.elements_found[0].element_type, "button");
    }

    #[test]
    fn analysis_with_no_content_is_empty() {
        let analysis: VisualAnalysis = serde_json::from_str("{}").unwrap();
        assert!(analysis.is_empty());
    }
}
