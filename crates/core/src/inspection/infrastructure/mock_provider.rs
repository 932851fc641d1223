use image::RgbImage;
use serde_json::json;

use crate::inspection::domain::inspection_provider::{InspectionProvider, ProviderError};

/// Offline provider returning the same minor-damage report for every image.
pub struct MockProvider {
    report: String,
}

impl MockProvider {
    pub fn new() -> Self {
        let damage = |damage_type: &str, location: &str, description: &str| {
            json!({
                "damage_type": damage_type,
                "severity": "Low",
                "location": location,
                "description": description,
                "repair_impact": "Cosmetic",
                "estimated_cost": "$500-$800"
            })
        };
        let report = json!({
            "damage_inventory": [
                damage("scratch", "front bumper", "Minor scratch on front bumper"),
                damage("paint chip", "driver side door", "Paint chip on driver side door"),
                damage("dent", "rear fender", "Small dent on rear fender")
            ]
        });
        Self {
            report: report.to_string(),
        }
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InspectionProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn analyze(&self, _prompt: &str, _image: &RgbImage) -> Result<String, ProviderError> {
        Ok(self.report.clone())
    }
}
