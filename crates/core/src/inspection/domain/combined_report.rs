use serde::{Deserialize, Serialize};

use crate::inspection::domain::analysis_result::{
    AnalysisResult, DamageEntry, EngineAssessment, ModificationAssessment, OverallAssessment,
    RepairItem,
};

/// The merged report of one analysis run.
///
/// Starts empty (zero scores, empty text and lists) and absorbs parsed
/// composite results in chunk order through [`CombinedReport::merge`]:
///
/// - `condition_score`, `engine_health_score`: running maximum.
/// - `estimated_age`: last non-empty value.
/// - `damage_inventory`, `identified_issues`, `aftermarket_parts`,
///   `repair_priority`: concatenated, duplicates kept.
/// - every other field: replaced by the latest result that sets it to a
///   non-empty value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedReport {
    pub overall_assessment: OverallAssessment,
    pub damage_inventory: Vec<DamageEntry>,
    pub engine_assessment: EngineAssessment,
    pub modification_assessment: ModificationAssessment,
    pub repair_priority: Vec<RepairItem>,
    /// Number of composite results folded in.
    pub composites_merged: usize,
}

impl CombinedReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, result: AnalysisResult) {
        let AnalysisResult {
            overall_assessment: overall,
            damage_inventory,
            engine_assessment: engine,
            modification_assessment: modification,
            repair_priority,
        } = result;

        let summary = &mut self.overall_assessment;
        summary.condition_score = summary.condition_score.max(overall.condition_score);
        summary.engine_health_score = summary.engine_health_score.max(overall.engine_health_score);
        replace_if_set(&mut summary.estimated_age, overall.estimated_age);

        self.damage_inventory.extend(damage_inventory);
        self.repair_priority.extend(repair_priority);

        let ours = &mut self.engine_assessment;
        ours.identified_issues.extend(engine.identified_issues);
        replace_if_set(&mut ours.sound_characteristics, engine.sound_characteristics);
        replace_list_if_set(&mut ours.performance_indicators, engine.performance_indicators);
        replace_list_if_set(
            &mut ours.maintenance_recommendations,
            engine.maintenance_recommendations,
        );

        let ours = &mut self.modification_assessment;
        ours.aftermarket_parts.extend(modification.aftermarket_parts);
        replace_if_set(&mut ours.modification_impact, modification.modification_impact);
        replace_list_if_set(&mut ours.missing_stock_parts, modification.missing_stock_parts);

        self.composites_merged += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.composites_merged == 0
    }
}

fn replace_if_set(slot: &mut String, value: String) {
    if !value.trim().is_empty() {
        *slot = value;
    }
}

fn replace_list_if_set(slot: &mut Vec<String>, value: Vec<String>) {
    if !value.is_empty() {
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn scored(condition: f64, engine: f64) -> AnalysisResult {
        AnalysisResult {
            overall_assessment: OverallAssessment {
                condition_score: condition,
                engine_health_score: engine,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn with_damages(labels: &[&str]) -> AnalysisResult {
        AnalysisResult {
            damage_inventory: labels
                .iter()
                .map(|l| DamageEntry {
                    damage_type: l.to_string(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_starts_empty() {
        let report = CombinedReport::new();
        assert!(report.is_empty());
        assert_relative_eq!(report.overall_assessment.condition_score, 0.0);
        assert!(report.damage_inventory.is_empty());
    }

    #[test]
    fn test_condition_score_takes_maximum() {
        let mut report = CombinedReport::new();
        report.merge(scored(4.0, 0.0));
        report.merge(scored(7.0, 0.0));
        assert_relative_eq!(report.overall_assessment.condition_score, 7.0);
    }

    #[test]
    fn test_max_fields_independent_of_order() {
        let values = [(4.0, 9.0), (7.0, 2.0), (5.5, 6.0)];
        let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        for order in orders {
            let mut report = CombinedReport::new();
            for i in order {
                report.merge(scored(values[i].0, values[i].1));
            }
            assert_relative_eq!(report.overall_assessment.condition_score, 7.0);
            assert_relative_eq!(report.overall_assessment.engine_health_score, 9.0);
        }
    }

    #[test]
    fn test_missing_score_does_not_lower_maximum() {
        let mut report = CombinedReport::new();
        report.merge(scored(8.0, 6.0));
        report.merge(AnalysisResult::default());
        assert_relative_eq!(report.overall_assessment.condition_score, 8.0);
        assert_relative_eq!(report.overall_assessment.engine_health_score, 6.0);
    }

    #[test]
    fn test_lists_concatenate_in_order_with_duplicates() {
        let mut report = CombinedReport::new();
        report.merge(with_damages(&["scratch", "dent"]));
        report.merge(with_damages(&[]));
        report.merge(with_damages(&["dent", "rust"]));

        let types: Vec<_> = report
            .damage_inventory
            .iter()
            .map(|d| d.damage_type.as_str())
            .collect();
        assert_eq!(types, vec!["scratch", "dent", "dent", "rust"]);
    }

    #[test]
    fn test_all_concatenated_lists_keep_every_entry() {
        let first = AnalysisResult {
            engine_assessment: EngineAssessment {
                identified_issues: vec!["ticking".into()],
                ..Default::default()
            },
            modification_assessment: ModificationAssessment {
                aftermarket_parts: vec!["exhaust".into(), "grips".into()],
                ..Default::default()
            },
            repair_priority: vec![RepairItem {
                item: "brakes".into(),
                urgency: "high".into(),
                safety_critical: true,
            }],
            ..Default::default()
        };
        let second = AnalysisResult {
            engine_assessment: EngineAssessment {
                identified_issues: vec!["ticking".into(), "rough idle".into()],
                ..Default::default()
            },
            modification_assessment: ModificationAssessment {
                aftermarket_parts: vec!["mirrors".into()],
                ..Default::default()
            },
            repair_priority: vec![RepairItem {
                item: "chain".into(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let mut report = CombinedReport::new();
        report.merge(first);
        report.merge(second);

        assert_eq!(
            report.engine_assessment.identified_issues,
            vec!["ticking", "ticking", "rough idle"]
        );
        assert_eq!(
            report.modification_assessment.aftermarket_parts,
            vec!["exhaust", "grips", "mirrors"]
        );
        let items: Vec<_> = report.repair_priority.iter().map(|r| r.item.as_str()).collect();
        assert_eq!(items, vec!["brakes", "chain"]);
        assert_eq!(report.composites_merged, 2);
    }

    #[test]
    fn test_estimated_age_last_non_empty_wins() {
        let age = |a: &str| AnalysisResult {
            overall_assessment: OverallAssessment {
                estimated_age: a.to_string(),
                ..Default::default()
            },
            ..Default::default()
        };

        let mut report = CombinedReport::new();
        report.merge(age("5 years"));
        report.merge(age("8 years"));
        report.merge(age(""));
        assert_eq!(report.overall_assessment.estimated_age, "8 years");
    }

    #[test]
    fn test_other_fields_overwritten_by_latest_setter() {
        let engine = |sound: &str, indicators: &[&str]| AnalysisResult {
            engine_assessment: EngineAssessment {
                sound_characteristics: sound.to_string(),
                performance_indicators: indicators.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            },
            ..Default::default()
        };

        let mut report = CombinedReport::new();
        report.merge(engine("smooth", &["quick start"]));
        report.merge(engine("uneven idle", &[]));
        report.merge(engine("  ", &["smoke on start"]));

        assert_eq!(report.engine_assessment.sound_characteristics, "uneven idle");
        assert_eq!(
            report.engine_assessment.performance_indicators,
            vec!["smoke on start"]
        );
    }
}
