//! Clause text validation.

use quarry_lang::{parse_filter, parse_sort};
use tracing::warn;

use crate::catalog::ModelCatalog;
use crate::error::Error;

/// Tokens rejected in caller-supplied clause text, matched without case.
/// Bare words must stand alone; the procedure prefixes match at a word
/// start.
const BLOCKLIST: [&str; 12] = [
    ";", "--", "/*", "*/", "xp_", "sp_", "drop", "delete", "truncate", "alter", "exec", "execute",
];

/// How clause text is validated before it is attached to a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClausePolicy {
    /// Reject statement separators and data-modification tokens, and
    /// require balanced parentheses in filters. Heuristic: it blocks the
    /// obvious injections, not every possible one.
    #[default]
    Blocklist,
    /// Everything `Blocklist` rejects, plus the text must parse in the
    /// clause grammar and reference only fields the catalog can resolve
    /// from the root entity.
    Typed,
}

pub(crate) fn validate_filter(
    catalog: &ModelCatalog,
    root_entity: &str,
    text: &str,
    policy: ClausePolicy,
) -> Result<(), Error> {
    if let Some(token) = find_blocked(text) {
        warn!(token, "rejected filter clause");
        return Err(Error::InvalidClause(format!(
            "filter contains blocked token '{token}'"
        )));
    }
    if !parens_balanced(text) {
        warn!("rejected filter clause with unbalanced parentheses");
        return Err(Error::InvalidClause(
            "unbalanced parentheses in filter".into(),
        ));
    }
    if policy == ClausePolicy::Typed {
        let expr = parse_filter(text).map_err(|e| Error::InvalidClause(e.to_string()))?;
        for path in expr.field_paths() {
            let dotted = path.dotted();
            if !catalog.is_valid_path(root_entity, &dotted) {
                warn!(field = %dotted, "rejected filter clause with unknown field");
                return Err(Error::InvalidClause(format!(
                    "unknown field '{dotted}' in filter"
                )));
            }
        }
    }
    Ok(())
}

pub(crate) fn validate_sort(
    catalog: &ModelCatalog,
    root_entity: &str,
    text: &str,
    policy: ClausePolicy,
) -> Result<(), Error> {
    if let Some(token) = find_blocked(text) {
        warn!(token, "rejected sort clause");
        return Err(Error::InvalidClause(format!(
            "sort contains blocked token '{token}'"
        )));
    }
    if policy == ClausePolicy::Typed {
        let keys = parse_sort(text).map_err(|e| Error::InvalidClause(e.to_string()))?;
        for key in &keys {
            let dotted = key.path.dotted();
            if !catalog.is_valid_path(root_entity, &dotted) {
                warn!(field = %dotted, "rejected sort clause with unknown field");
                return Err(Error::InvalidClause(format!(
                    "unknown field '{dotted}' in sort"
                )));
            }
        }
    }
    Ok(())
}

fn find_blocked(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    for token in BLOCKLIST {
        let is_word = token.chars().all(|c| c.is_ascii_alphabetic());
        let is_prefix = token.ends_with('_');
        if !is_word && !is_prefix {
            if lowered.contains(token) {
                return Some(token);
            }
            continue;
        }
        for (at, _) in lowered.match_indices(token) {
            let left_bounded = at == 0 || !is_word_byte(lowered.as_bytes()[at - 1]);
            let right_bounded = if is_prefix {
                true
            } else {
                let end = at + token.len();
                end >= lowered.len() || !is_word_byte(lowered.as_bytes()[end])
            };
            if left_bounded && right_bounded {
                return Some(token);
            }
        }
    }
    None
}

fn is_word_byte(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric()
}

fn parens_balanced(text: &str) -> bool {
    let mut depth = 0i32;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}
