use motoscan_core::inspection::domain::combined_report::CombinedReport;
use motoscan_core::pipeline::analyze_media_use_case::InspectionOutcome;
use motoscan_core::session::inspection_session::SessionReport;

/// Plain-text report for one analysis run.
pub fn outcome(outcome: &InspectionOutcome) -> String {
    let mut lines = vec![format!("Inspection of {}", outcome.source.display())];
    match (outcome.fps, outcome.duration_secs) {
        (Some(fps), Some(secs)) => lines.push(format!(
            "{} frames sampled ({secs:.1}s at {fps} fps) into {} composites{}",
            outcome.frames_sampled,
            outcome.composites,
            if outcome.truncated { ", decoding stopped early" } else { "" }
        )),
        _ => lines.push("Still image, 1 composite".to_string()),
    }
    lines.push(String::new());

    lines.extend(report(&outcome.report));

    if !outcome.failures.is_empty() {
        lines.push(String::new());
        lines.push("## Failed Requests".to_string());
        for failure in &outcome.failures {
            lines.push(format!("- composite {}: {}", failure.chunk_index, failure.message));
        }
    }
    if !outcome.overflow.is_empty() {
        lines.push(String::new());
        lines.push("## Unstructured Observations".to_string());
        for text in &outcome.overflow {
            lines.push(text.trim().to_string());
            lines.push(String::new());
        }
    }

    lines.join("\n") + "\n"
}

/// Plain-text block for one session upload.
pub fn session_report(report: &SessionReport) -> String {
    let mut lines = vec![
        format!("=== Report for {} ===", report.file_name),
        format!("Inspection Time: {}", report.inspected_at),
    ];
    if let Some(thumb) = &report.thumbnail {
        lines.push(format!("Thumbnail: {}", thumb.display()));
    }
    lines.push(String::new());
    lines.push(outcome(&report.outcome));
    lines.join("\n")
}

fn report(report: &CombinedReport) -> Vec<String> {
    if report.is_empty() {
        return vec!["No structured results.".to_string()];
    }

    let overall = &report.overall_assessment;
    let engine = &report.engine_assessment;
    let mods = &report.modification_assessment;

    let mut lines = vec![
        "## Overall Assessment".to_string(),
        format!("Condition Score: {}/10", overall.condition_score),
        format!("Estimated Age: {}", overall.estimated_age),
        format!("Engine Health: {}/10", overall.engine_health_score),
        String::new(),
        "## Damage Inventory".to_string(),
    ];
    if report.damage_inventory.is_empty() {
        lines.push("None found".to_string());
    }
    for damage in &report.damage_inventory {
        lines.push(format!("* {} - {}", damage.damage_type, damage.location));
        lines.push(format!("    Severity: {}", damage.severity));
        lines.push(format!("    Description: {}", damage.description));
        lines.push(format!("    Repair Impact: {}", damage.repair_impact));
        lines.push(format!("    Estimated Cost: {}", damage.estimated_cost));
    }

    lines.push(String::new());
    lines.push("## Engine Assessment".to_string());
    lines.push(format!("Sound Characteristics: {}", engine.sound_characteristics));
    lines.push(format!("Issues: {}", engine.identified_issues.join(", ")));
    if !engine.performance_indicators.is_empty() {
        lines.push(format!(
            "Performance: {}",
            engine.performance_indicators.join(", ")
        ));
    }
    if !engine.maintenance_recommendations.is_empty() {
        lines.push(format!(
            "Maintenance: {}",
            engine.maintenance_recommendations.join(", ")
        ));
    }

    lines.push(String::new());
    lines.push("## Modifications".to_string());
    lines.push(format!("Aftermarket Parts: {}", mods.aftermarket_parts.join(", ")));
    if !mods.missing_stock_parts.is_empty() {
        lines.push(format!("Missing Stock Parts: {}", mods.missing_stock_parts.join(", ")));
    }
    lines.push(format!("Impact: {}", mods.modification_impact));

    lines.push(String::new());
    lines.push("## Repair Priorities".to_string());
    for repair in &report.repair_priority {
        lines.push(format!(
            "- {} (Urgency: {}, Safety Critical: {})",
            repair.item, repair.urgency, repair.safety_critical
        ));
    }
    lines
}
