use std::sync::LazyLock;

use regex::Regex;

/// A ```json fenced block; the tag is matched case-insensitively.
static FENCED_JSON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)```json\s*(.*?)\s*```").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    FencedBlock,
    OuterBraces,
}

/// JSON text located inside a model response, not yet parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub text: &'a str,
    pub source: CandidateSource,
}

/// Locate the JSON payload in a raw model response.
///
/// A fenced ```json block wins over any braces elsewhere in the text. Without
/// one, the span from the first `{` to the last `}` is used. `None` when
/// neither is present.
pub fn extract_json_candidate(raw: &str) -> Option<Candidate<'_>> {
    if let Some(inner) = FENCED_JSON.captures(raw).and_then(|caps| caps.get(1)) {
        return Some(Candidate {
            text: inner.as_str(),
            source: CandidateSource::FencedBlock,
        });
    }

    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| Candidate {
        text: &raw[start..=end],
        source: CandidateSource::OuterBraces,
    })
}
