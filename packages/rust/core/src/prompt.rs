//! Task prompts sent to the language model.
//!
//! Each prompt embeds the page and spells out the exact JSON object the model
//! must return. That contract is what [`crate::response`] enforces.

use std::fmt;

use founderfuel_shared::PageContent;

/// The two model-backed tasks a pipeline run can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Scored landing-page critique.
    Critique,
    /// Social and newsletter copy.
    Repurpose,
}

impl TaskKind {
    /// Stable lowercase name, used in logs and spans.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critique => "critique",
            Self::Repurpose => "repurpose",
        }
    }

    /// How many characters of body text the prompt embeds.
    pub fn body_prefix_chars(&self) -> usize {
        match self {
            Self::Critique => 3000,
            Self::Repurpose => 4000,
        }
    }

    /// Sampling temperature: low for stable scores, higher for varied copy.
    pub fn temperature(&self) -> f64 {
        match self {
            Self::Critique => 0.3,
            Self::Repurpose => 0.7,
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Render the full instruction text for `task` over `page` fetched from `url`.
pub fn build_prompt(task: TaskKind, url: &str, page: &PageContent) -> String {
    let body = char_prefix(&page.body_text, task.body_prefix_chars());
    match task {
        TaskKind::Critique => critique_prompt(url, page, body),
        TaskKind::Repurpose => repurpose_prompt(url, page, body),
    }
}

fn critique_prompt(url: &str, page: &PageContent, body: &str) -> String {
    format!(
        r#"You review startup landing pages for conversion. Rate the page below on four criteria, each an integer from 1 (poor) to 10 (excellent).

URL: {url}
Title: {title}
Meta description: {description}
Page text:
{body}

Criteria:
- headlineScore: does the headline state a concrete benefit clearly, in roughly ten words or fewer?
- valueScore: is it obvious within seconds what problem the product solves and for whom?
- ctaScore: is there a visible, action-oriented call to action with an unambiguous next step?
- trustScore: does the page show testimonials, customer logos, numbers, or other credibility signals?

Return ONLY a JSON object with exactly these fields. No prose before or after it, no markdown, no code fences:
{{
  "headlineScore": <integer 1-10>,
  "valueScore": <integer 1-10>,
  "ctaScore": <integer 1-10>,
  "trustScore": <integer 1-10>,
  "feedback": "<two or three short paragraphs: what works, what to fix, and the three most impactful changes>"
}}"#,
        title = page.title,
        description = page.description,
    )
}

fn repurpose_prompt(url: &str, page: &PageContent, body: &str) -> String {
    format!(
        r#"You turn founder blog posts into distribution-ready copy. Rewrite the post below in three formats.

URL: {url}
Title: {title}
Meta description: {description}
Post text:
{body}

Return ONLY a JSON object with exactly these three string fields. No prose before or after it, no markdown, no code fences:
{{
  "twitterThread": "<5 to 7 tweets, one per line, each prefixed 1/, 2/, ... and under 280 characters; open with a hook>",
  "linkedinPost": "<300 to 500 words in a professional voice: hook, key insights, a personal angle, and a closing question or call to action; use line breaks>",
  "newsletter": "<200 to 300 words in a conversational tone: the key takeaway, a short summary, and why the reader should care>"
}}"#,
        title = page.title,
        description = page.description,
    )
}

/// The first `max_chars` characters of `s`, never splitting a code point.
fn char_prefix(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
