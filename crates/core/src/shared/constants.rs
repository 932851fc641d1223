/// Frames per chunk (~1 second at 30 fps).
pub const DEFAULT_CHUNK_SIZE: usize = 30;

/// Largest width or height a sampled frame may keep, and the grid cell size.
pub const DEFAULT_TILE_SIZE: u32 = 1024;

/// Bounding box for upload thumbnails.
pub const THUMBNAIL_SIZE: u32 = 128;

pub const COMPOSITE_JPEG_QUALITY: u8 = 90;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "tiff", "tif", "webp"];

/// Upload types accepted by an inspection session.
pub const UPLOAD_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "mp4", "avi", "mov"];

/// Upload types that get a thumbnail when stored.
pub const THUMBNAIL_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif"];

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Instruction sent with every composite. Constant for a whole run.
pub const ANALYSIS_PROMPT: &str = "\
Analyze this motorcycle inspection video carefully and provide a comprehensive damage assessment.
Only base your analysis strictly on what information is available in the video.
Be thorough in identifying all visible and audible issues.

For each identified issue, assess:
Type of damage (dent, scratch, rust, missing part, etc.)
Severity (minor, moderate, severe)
Location on the motorcycle
Estimated repair/replacement cost impact

Pay special attention to:
Structural damage (frame, forks, swingarm)
Engine condition (based on sound analysis)
Missing or aftermarket parts
Paint condition (scratches, chips, fading)
Rust or corrosion
Modifications from stock configuration
Mechanical issues detectable from engine sound (knocking, ticking, irregular idle)

For engine sound analysis:
Assess cold start behavior
Evaluate idle stability
Note any unusual sounds at different RPMs
Estimate engine health and approximate age based on sound characteristics
Identify potential mechanical issues

The image is a grid of consecutive video frames, read left to right, top to bottom.
Respond with a single JSON object and nothing else, using this structure:
{
  \"overall_assessment\": {\"condition_score\": 0-10, \"estimated_age\": \"\", \"engine_health_score\": 0-10},
  \"damage_inventory\": [{\"damage_type\": \"\", \"severity\": \"\", \"location\": \"\", \"description\": \"\", \"repair_impact\": \"\", \"estimated_cost\": \"\"}],
  \"engine_assessment\": {\"sound_characteristics\": \"\", \"identified_issues\": [], \"performance_indicators\": [], \"maintenance_recommendations\": []},
  \"modification_assessment\": {\"aftermarket_parts\": [], \"missing_stock_parts\": [], \"modification_impact\": \"\"},
  \"repair_priority\": [{\"item\": \"\", \"urgency\": \"\", \"safety_critical\": false}]
}";
