use serde::{Deserialize, Serialize};

/// One composite's structured answer, as the vision model returns it.
///
/// Every field is optional in the response. Scores accept numbers or
/// numeric strings ("7", "7/10"); free text accepts strings or numbers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisResult {
    #[serde(deserialize_with = "lenient::or_default")]
    pub overall_assessment: OverallAssessment,
    #[serde(deserialize_with = "lenient::or_default")]
    pub damage_inventory: Vec<DamageEntry>,
    #[serde(deserialize_with = "lenient::or_default")]
    pub engine_assessment: EngineAssessment,
    #[serde(deserialize_with = "lenient::or_default")]
    pub modification_assessment: ModificationAssessment,
    #[serde(deserialize_with = "lenient::or_default")]
    pub repair_priority: Vec<RepairItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverallAssessment {
    /// 0-10.
    #[serde(deserialize_with = "lenient::score")]
    pub condition_score: f64,
    #[serde(deserialize_with = "lenient::text")]
    pub estimated_age: String,
    /// 0-10.
    #[serde(deserialize_with = "lenient::score")]
    pub engine_health_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageEntry {
    #[serde(deserialize_with = "lenient::text")]
    pub damage_type: String,
    #[serde(deserialize_with = "lenient::text")]
    pub severity: String,
    #[serde(deserialize_with = "lenient::text")]
    pub location: String,
    #[serde(deserialize_with = "lenient::text")]
    pub description: String,
    #[serde(deserialize_with = "lenient::text")]
    pub repair_impact: String,
    #[serde(deserialize_with = "lenient::text")]
    pub estimated_cost: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineAssessment {
    #[serde(deserialize_with = "lenient::text")]
    pub sound_characteristics: String,
    #[serde(deserialize_with = "lenient::text_list")]
    pub identified_issues: Vec<String>,
    #[serde(deserialize_with = "lenient::text_list")]
    pub performance_indicators: Vec<String>,
    #[serde(deserialize_with = "lenient::text_list")]
    pub maintenance_recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModificationAssessment {
    #[serde(deserialize_with = "lenient::text_list")]
    pub aftermarket_parts: Vec<String>,
    #[serde(deserialize_with = "lenient::text_list")]
    pub missing_stock_parts: Vec<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub modification_impact: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairItem {
    #[serde(deserialize_with = "lenient::text")]
    pub item: String,
    #[serde(deserialize_with = "lenient::text")]
    pub urgency: String,
    #[serde(deserialize_with = "lenient::flag")]
    pub safety_critical: bool,
}

/// Field deserializers that accept the loose typing vision models produce.
mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    pub fn score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(0.0),
            Value::String(s) if s.trim().is_empty() => Ok(0.0),
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| D::Error::custom("score out of range")),
            Value::String(s) => leading_number(&s)
                .ok_or_else(|| D::Error::custom(format!("score is not numeric: {s:?}"))),
            other => Err(D::Error::custom(format!("score is not numeric: {other}"))),
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(value_to_text(Value::deserialize(deserializer)?))
    }

    pub fn text_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => Vec::new(),
            Value::Array(items) => items
                .into_iter()
                .filter(|v| !v.is_null())
                .map(value_to_text)
                .collect(),
            single => vec![value_to_text(single)],
        })
    }

    pub fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" => Ok(true),
                "false" | "no" | "n" | "" => Ok(false),
                _ => Err(D::Error::custom(format!("not a boolean: {s:?}"))),
            },
            Value::Number(n) => Ok(n.as_f64().is_some_and(|v| v != 0.0)),
            other => Err(D::Error::custom(format!("not a boolean: {other}"))),
        }
    }

    fn value_to_text(value: Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s,
            other => other.to_string(),
        }
    }

    /// Parses the numeric prefix of strings like "7", "7.5/10" or " 8 out of 10".
    pub(super) fn leading_number(s: &str) -> Option<f64> {
        let s = s.trim();
        let end = s
            .char_indices()
            .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || (i == 0 && c == '-')))
            .map(|(i, _)| i)
            .unwrap_or(s.len());
        s[..end].parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn parse(json: &str) -> Result<AnalysisResult, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn test_full_document() {
        let result = parse(
            r#"{
                "overall_assessment": {"condition_score": 6, "estimated_age": "8-10 years", "engine_health_score": 7.5},
                "damage_inventory": [{"damage_type": "scratch", "severity": "minor", "location": "tank",
                                      "description": "light scuff", "repair_impact": "cosmetic", "estimated_cost": "$80"}],
                "engine_assessment": {"sound_characteristics": "steady idle", "identified_issues": ["ticking"],
                                      "performance_indicators": ["clean start"], "maintenance_recommendations": ["valve check"]},
                "modification_assessment": {"aftermarket_parts": ["exhaust"], "missing_stock_parts": ["mirror"],
                                            "modification_impact": "louder"},
                "repair_priority": [{"item": "mirror", "urgency": "high", "safety_critical": true}]
            }"#,
        )
        .unwrap();

        assert_relative_eq!(result.overall_assessment.condition_score, 6.0);
        assert_relative_eq!(result.overall_assessment.engine_health_score, 7.5);
        assert_eq!(result.overall_assessment.estimated_age, "8-10 years");
        assert_eq!(result.damage_inventory[0].estimated_cost, "$80");
        assert_eq!(result.engine_assessment.identified_issues, vec!["ticking"]);
        assert_eq!(result.modification_assessment.missing_stock_parts, vec!["mirror"]);
        assert!(result.repair_priority[0].safety_critical);
    }

    #[test]
    fn test_missing_sections_default() {
        let result = parse(r#"{"damage_inventory": []}"#).unwrap();
        assert_eq!(result, AnalysisResult::default());
    }

    #[test]
    fn test_null_sections_default() {
        let result = parse(r#"{"overall_assessment": null, "repair_priority": null}"#).unwrap();
        assert_eq!(result, AnalysisResult::default());
    }

    #[test]
    fn test_loose_types_are_accepted() {
        let result = parse(
            r#"{
                "overall_assessment": {"condition_score": "7/10", "estimated_age": 12},
                "damage_inventory": [{"damage_type": "dent", "estimated_cost": 250}],
                "engine_assessment": {"identified_issues": "knocking at idle"},
                "repair_priority": [{"item": "fork seal", "safety_critical": "yes"}]
            }"#,
        )
        .unwrap();

        assert_relative_eq!(result.overall_assessment.condition_score, 7.0);
        assert_eq!(result.overall_assessment.estimated_age, "12");
        assert_eq!(result.damage_inventory[0].estimated_cost, "250");
        assert_eq!(
            result.engine_assessment.identified_issues,
            vec!["knocking at idle"]
        );
        assert!(result.repair_priority[0].safety_critical);
    }

    #[rstest]
    #[case::empty("")]
    #[case::whitespace("  ")]
    fn test_blank_score_counts_as_unset(#[case] blank: &str) {
        let json = format!(
            r#"{{"overall_assessment": {{"condition_score": "{blank}", "engine_health_score": 6}}}}"#
        );
        let result = parse(&json).unwrap();
        assert_relative_eq!(result.overall_assessment.condition_score, 0.0);
        assert_relative_eq!(result.overall_assessment.engine_health_score, 6.0);
    }

    #[test]
    fn test_non_numeric_score_is_rejected() {
        assert!(parse(r#"{"overall_assessment": {"condition_score": "good"}}"#).is_err());
    }

    #[rstest]
    #[case("7", Some(7.0))]
    #[case("7.5/10", Some(7.5))]
    #[case(" 8 out of 10", Some(8.0))]
    #[case("-1", Some(-1.0))]
    #[case("ten", None)]
    #[case("", None)]
    fn test_leading_number(#[case] input: &str, #[case] expected: Option<f64>) {
        assert_eq!(lenient::leading_number(input), expected);
    }
}
