//! Maps classifier labels onto the emergency categories the service reports.

use std::fmt;

use serde::Serialize;

use crate::classifier::Prediction;

/// Emergency category an image can be verified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DangerCategory {
    Fire,
    Flood,
    Accident,
    Weapon,
}

impl DangerCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DangerCategory::Fire => "fire",
            DangerCategory::Flood => "flood",
            DangerCategory::Accident => "accident",
            DangerCategory::Weapon => "weapon",
        }
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        DANGER_KEYWORDS
            .iter()
            .find(|(category, _)| category == self)
            .map(|(_, keywords)| *keywords)
            .unwrap_or(&[])
    }
}

impl fmt::Display for DangerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category → substring keywords, in matching order.
pub const DANGER_KEYWORDS: &[(DangerCategory, &[&str])] = &[
    (DangerCategory::Fire, &["fire", "flame", "burning", "bonfire", "fireplace", "volcano", "eruption"]),
    (DangerCategory::Flood, &["flood", "water", "river", "lake", "ocean", "wave", "storm", "rain"]),
    (DangerCategory::Accident, &["car", "crash", "ambulance", "wreck", "vehicle", "truck", "bus"]),
    (DangerCategory::Weapon, &["gun", "rifle", "pistol", "knife", "sword", "explosive"]),
];

/// Lowercases a label and turns `_` separators into spaces.
pub fn normalize_label(label: &str) -> String {
    label.to_lowercase().replace('_', " ")
}

/// First category whose keyword occurs in the normalized label.
pub fn match_category(label: &str) -> Option<DangerCategory> {
    let normalized = normalize_label(label);
    DANGER_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| normalized.contains(kw)))
        .map(|(category, _)| *category)
}

/// Verification result returned by `/predict`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub verified: bool,
    pub detected_category: Option<DangerCategory>,
    pub confidence: f32,
    pub raw_detections: Vec<Prediction>,
}

impl Assessment {
    /// Scans the predictions for danger keywords and keeps the
    /// highest-confidence match. Equal confidences keep the earlier match.
    pub fn from_predictions(predictions: Vec<Prediction>) -> Self {
        let mut best: Option<(DangerCategory, f32)> = None;

        for prediction in &predictions {
            let normalized = normalize_label(&prediction.label);
            for (category, keywords) in DANGER_KEYWORDS {
                if !keywords.iter().any(|kw| normalized.contains(kw)) {
                    continue;
                }
                let better = match best {
                    Some((_, confidence)) => prediction.confidence > confidence,
                    None => true,
                };
                if better {
                    best = Some((*category, prediction.confidence));
                }
            }
        }

        Self {
            verified: best.is_some(),
            detected_category: best.map(|(category, _)| category),
            confidence: best.map(|(_, confidence)| confidence).unwrap_or(0.0),
            raw_detections: predictions,
        }
    }
}
