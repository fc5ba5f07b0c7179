//! Parsing of raw model output into validated task results.
//!
//! Two steps, both strict: strip a surrounding code fence if present, then
//! parse the remainder as one JSON object. Anything else is a
//! [`FounderFuelError::MalformedResponse`]; there is no partial recovery.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use founderfuel_shared::{
    CritiqueScores, FounderFuelError, RepurposedContent, Result, SCORE_MAX, SCORE_MIN,
};

type JsonObject = Map<String, Value>;

/// An opening fence with an optional language tag, e.g. ```` ```json ````.
static LEADING_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^```[\w-]*\s*").expect("valid regex"));
static TRAILING_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*```$").expect("valid regex"));

/// Remove one leading and one trailing code fence, if present.
pub fn strip_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_open = LEADING_FENCE_RE.replace(trimmed, "");
    let without_close = TRAILING_FENCE_RE.replace(&without_open, "");
    without_close.trim().to_string()
}

/// Parse a critique response and compute the overall score.
pub fn parse_critique(raw: &str) -> Result<CritiqueScores> {
    let obj = parse_object(raw)?;

    let headline_score = score_field(&obj, "headlineScore")?;
    let value_score = score_field(&obj, "valueScore")?;
    let cta_score = score_field(&obj, "ctaScore")?;
    let trust_score = score_field(&obj, "trustScore")?;
    let feedback = text_field(&obj, "feedback")?;

    Ok(CritiqueScores {
        headline_score,
        value_score,
        cta_score,
        trust_score,
        overall_score: overall_score([headline_score, value_score, cta_score, trust_score]),
        feedback,
    })
}

/// Parse a repurpose response.
pub fn parse_repurpose(raw: &str) -> Result<RepurposedContent> {
    let obj = parse_object(raw)?;

    Ok(RepurposedContent {
        twitter_thread: text_field(&obj, "twitterThread")?,
        linkedin_post: text_field(&obj, "linkedinPost")?,
        newsletter: text_field(&obj, "newsletter")?,
    })
}

/// Mean of the four sub-scores, rounded to nearest with ties rounding up.
///
/// Integer arithmetic: `(sum + 2) / 4` is `floor(mean + 0.5)`.
pub fn overall_score(scores: [u8; 4]) -> u8 {
    let sum: u16 = scores.iter().map(|&s| u16::from(s)).sum();
    // sum <= 4 * u8::MAX, so the quotient always fits
    ((sum + 2) / 4) as u8
}

fn parse_object(raw: &str) -> Result<JsonObject> {
    let body = strip_fences(raw);
    let value: Value = serde_json::from_str(&body)
        .map_err(|e| FounderFuelError::malformed(format!("response is not valid JSON: {e}")))?;

    match value {
        Value::Object(obj) => Ok(obj),
        other => Err(FounderFuelError::malformed(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// An integer score in `[SCORE_MIN, SCORE_MAX]`. Integral floats (`8.0`) are
/// accepted; fractions, strings and out-of-range values are not.
fn score_field(obj: &JsonObject, name: &str) -> Result<u8> {
    let value = obj
        .get(name)
        .ok_or_else(|| FounderFuelError::malformed(format!("missing field `{name}`")))?;

    let as_int = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        _ => None,
    };

    as_int
        .filter(|v| (i64::from(SCORE_MIN)..=i64::from(SCORE_MAX)).contains(v))
        .map(|v| v as u8)
        .ok_or_else(|| {
            FounderFuelError::malformed(format!(
                "`{name}` must be an integer from {SCORE_MIN} to {SCORE_MAX}, got {value}"
            ))
        })
}

/// A non-blank string field.
fn text_field(obj: &JsonObject, name: &str) -> Result<String> {
    match obj.get(name) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(FounderFuelError::malformed(format!("`{name}` is empty"))),
        Some(other) => Err(FounderFuelError::malformed(format!(
            "`{name}` must be a string, got {}",
            json_kind(other)
        ))),
        None => Err(FounderFuelError::malformed(format!("missing field `{name}`"))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CRITIQUE: &str = r#"{"headlineScore":8,"valueScore":6,"ctaScore":7,"trustScore":5,"feedback":"Strong headline."}"#;

    fn assert_malformed<T: std::fmt::Debug>(result: Result<T>) {
        match result {
            Err(FounderFuelError::MalformedResponse { .. }) => {}
            other => panic!("expected MalformedResponse, got {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // Fence stripping
    // -----------------------------------------------------------------------

    #[test]
    fn strips_json_fence() {
        let fenced = format!("```json\n{CRITIQUE}\n```");
        assert_eq!(strip_fences(&fenced), CRITIQUE);
    }

    #[test]
    fn strips_bare_fence_and_surrounding_whitespace() {
        let fenced = format!("\n  ```\n{CRITIQUE}\n```  \n");
        assert_eq!(strip_fences(&fenced), CRITIQUE);
    }

    #[test]
    fn unfenced_text_is_only_trimmed() {
        assert_eq!(strip_fences("  {\"a\":1}\n"), "{\"a\":1}");
    }

    #[test]
    fn fenced_and_unfenced_parse_identically() {
        let plain = parse_critique(CRITIQUE).unwrap();
        let fenced = parse_critique(&format!("```json\n{CRITIQUE}\n```")).unwrap();
        let single_line = parse_critique(&format!("```{CRITIQUE}```")).unwrap();
        assert_eq!(plain, fenced);
        assert_eq!(plain, single_line);
    }

    // -----------------------------------------------------------------------
    // Critique
    // -----------------------------------------------------------------------

    #[test]
    fn parses_critique_and_rounds_half_up() {
        let scores = parse_critique(CRITIQUE).unwrap();
        assert_eq!(scores.headline_score, 8);
        assert_eq!(scores.trust_score, 5);
        // (8 + 6 + 7 + 5) / 4 = 6.5
        assert_eq!(scores.overall_score, 7);
        assert_eq!(scores.feedback, "Strong headline.");
    }

    #[test]
    fn overall_score_rounding() {
        assert_eq!(overall_score([8, 6, 7, 5]), 7); // 6.5
        assert_eq!(overall_score([7, 6, 6, 6]), 6); // 6.25
        assert_eq!(overall_score([7, 7, 7, 6]), 7); // 6.75
        assert_eq!(overall_score([1, 1, 1, 2]), 1); // 1.25
        assert_eq!(overall_score([1, 1, 2, 2]), 2); // 1.5
        assert_eq!(overall_score([10, 10, 10, 10]), 10);
        assert_eq!(overall_score([1, 1, 1, 1]), 1);
    }

    #[test]
    fn accepts_integral_floats() {
        let raw = r#"{"headlineScore":8.0,"valueScore":6,"ctaScore":7,"trustScore":5,"feedback":"ok"}"#;
        assert_eq!(parse_critique(raw).unwrap().headline_score, 8);
    }

    #[test]
    fn ignores_extra_fields() {
        let raw = r#"{"headlineScore":8,"valueScore":6,"ctaScore":7,"trustScore":5,"feedback":"ok","overallScore":1}"#;
        assert_eq!(parse_critique(raw).unwrap().overall_score, 7);
    }

    #[test]
    fn missing_score_is_malformed() {
        let raw = r#"{"headlineScore":8,"valueScore":6,"ctaScore":7,"feedback":"ok"}"#;
        assert_malformed(parse_critique(raw));
    }

    #[test]
    fn out_of_range_scores_are_malformed_not_clamped() {
        for bad in ["0", "11", "-3", "100"] {
            let raw = format!(
                r#"{{"headlineScore":{bad},"valueScore":6,"ctaScore":7,"trustScore":5,"feedback":"ok"}}"#
            );
            assert_malformed(parse_critique(&raw));
        }
    }

    #[test]
    fn non_integer_scores_are_malformed() {
        for bad in ["7.5", "\"8\"", "null", "true"] {
            let raw = format!(
                r#"{{"headlineScore":{bad},"valueScore":6,"ctaScore":7,"trustScore":5,"feedback":"ok"}}"#
            );
            assert_malformed(parse_critique(&raw));
        }
    }

    #[test]
    fn blank_or_missing_feedback_is_malformed() {
        assert_malformed(parse_critique(
            r#"{"headlineScore":8,"valueScore":6,"ctaScore":7,"trustScore":5,"feedback":"   "}"#,
        ));
        assert_malformed(parse_critique(
            r#"{"headlineScore":8,"valueScore":6,"ctaScore":7,"trustScore":5}"#,
        ));
        assert_malformed(parse_critique(
            r#"{"headlineScore":8,"valueScore":6,"ctaScore":7,"trustScore":5,"feedback":["a"]}"#,
        ));
    }

    #[test]
    fn prose_is_malformed() {
        assert_malformed(parse_critique("Sure! Here is my analysis: the headline is great."));
        assert_malformed(parse_critique(&format!("Here you go: {CRITIQUE}")));
        assert_malformed(parse_critique(""));
    }

    #[test]
    fn non_object_json_is_malformed() {
        assert_malformed(parse_critique("[1, 2, 3]"));
        assert_malformed(parse_critique("42"));
    }

    // -----------------------------------------------------------------------
    // Repurpose
    // -----------------------------------------------------------------------

    #[test]
    fn parses_repurpose() {
        let raw = "```json\n{\"twitterThread\":\"1/ Hook\\n2/ Point\",\"linkedinPost\":\"Post\",\"newsletter\":\"Issue\"}\n```";
        let content = parse_repurpose(raw).unwrap();
        assert_eq!(content.twitter_thread, "1/ Hook\n2/ Point");
        assert_eq!(content.linkedin_post, "Post");
        assert_eq!(content.newsletter, "Issue");
    }

    #[test]
    fn repurpose_requires_all_three_fields() {
        assert_malformed(parse_repurpose(r#"{"twitterThread":"t","linkedinPost":"l"}"#));
        assert_malformed(parse_repurpose(
            r#"{"twitterThread":"t","linkedinPost":"","newsletter":"n"}"#,
        ));
        assert_malformed(parse_repurpose(
            r#"{"twitterThread":5,"linkedinPost":"l","newsletter":"n"}"#,
        ));
    }
}
