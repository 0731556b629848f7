//! Plan markup parser.
//!
//! The model replies with a lightweight tag format: one outer
//! `<weftArtifact id=".." title="..">` wrapper containing any number of
//! `<weftAction>` tags. A `type="file"` action carries a `filePath`
//! attribute and its inner text is the full file content; a
//! `type="shell"` action's inner text is the command line. Prose outside
//! the recognized tags is ignored.
//!
//! Parsing is a single linear scan over the text. Malformed fragments
//! (missing attributes, unterminated action tags) are dropped with a
//! warning and the scan continues; a block with no artifact close tag at
//! all yields an empty plan, so truncated model output never materializes
//! partial content.

use tracing::warn;

use super::action::{ActionPath, BuildAction};

const ARTIFACT_OPEN: &str = "<weftArtifact";
const ARTIFACT_CLOSE: &str = "</weftArtifact>";
const ACTION_OPEN: &str = "<weftAction";
const ACTION_CLOSE: &str = "</weftAction>";

/// The outcome of parsing one block of plan text.
///
/// The wrapper's `title` attribute is carried on the batch itself rather
/// than as a synthetic action; no tree node is ever created from it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedPlan {
    /// Title from the artifact wrapper, if present.
    pub title: Option<String>,
    /// Build actions in source order. Source order is application order.
    pub actions: Vec<BuildAction>,
}

impl ParsedPlan {
    /// True when the text produced no actions at all.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Parse one block of plan text into an ordered sequence of build
/// actions. Never fails: unrecoverable input degrades to an empty plan.
pub fn parse_plan(text: &str) -> ParsedPlan {
    // Locate the artifact wrapper. Anything before it is prose.
    let Some(open_at) = find_tag(text, ARTIFACT_OPEN) else {
        return ParsedPlan::default();
    };
    let after_open = &text[open_at + ARTIFACT_OPEN.len()..];
    let Some(header_end) = after_open.find('>') else {
        warn!("artifact opening tag is unterminated; ignoring block");
        return ParsedPlan::default();
    };
    let title = attr_value(&after_open[..header_end], "title").map(str::to_owned);

    let body = &after_open[header_end + 1..];
    let Some(close_at) = body.find(ARTIFACT_CLOSE) else {
        // No trailing closer: the block is truncated. Emit nothing rather
        // than a partial sequence.
        warn!("artifact has no closing tag; ignoring block");
        return ParsedPlan::default();
    };

    let mut actions = Vec::new();
    let mut rest = &body[..close_at];

    while let Some(at) = find_tag(rest, ACTION_OPEN) {
        let after = &rest[at + ACTION_OPEN.len()..];
        let Some(header_end) = after.find('>') else {
            warn!("action opening tag is unterminated; dropping remainder");
            break;
        };
        let header = &after[..header_end];
        let inner_and_rest = &after[header_end + 1..];
        let Some(end) = inner_and_rest.find(ACTION_CLOSE) else {
            warn!("action tag has no closing tag; dropping fragment");
            break;
        };
        let inner = &inner_and_rest[..end];
        rest = &inner_and_rest[end + ACTION_CLOSE.len()..];

        match attr_value(header, "type") {
            Some("file") => match attr_value(header, "filePath") {
                Some(raw_path) => match ActionPath::parse(raw_path) {
                    Ok(path) => actions.push(BuildAction::create_file(path, inner.trim())),
                    Err(e) => warn!(path = raw_path, error = %e, "skipping file action with invalid path"),
                },
                None => warn!("skipping file action with no filePath attribute"),
            },
            Some("shell") => actions.push(BuildAction::run_script(inner.trim())),
            Some(other) => warn!(action_type = other, "skipping action with unrecognized type"),
            None => warn!("skipping action with no type attribute"),
        }
    }

    ParsedPlan { title, actions }
}

/// Find a tag opener, requiring a word boundary after the tag name so
/// `<weftAction` does not match `<weftActionable`.
fn find_tag(text: &str, tag: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(pos) = text[from..].find(tag) {
        let at = from + pos;
        let after = at + tag.len();
        match text.as_bytes().get(after) {
            Some(b) if b.is_ascii_whitespace() || *b == b'>' => return Some(at),
            None => return None,
            _ => from = after,
        }
    }
    None
}

/// Extract a `name="value"` attribute from a tag header. Values may not
/// contain escaped quotes; the markup format does not produce them.
fn attr_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    let needle = format!("{name}=\"");
    let start = header.find(&needle)? + needle.len();
    let end = header[start..].find('"')?;
    Some(&header[start..start + end])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
