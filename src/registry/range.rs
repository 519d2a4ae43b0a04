//! Declared dependency specs to concrete versions.
//!
//! Policy: the highest published version satisfying the declared range. A spec
//! naming a dist-tag selects the tagged version. npm range syntax is rewritten
//! into `semver::VersionReq` alternatives before matching.

use crate::error::RangeError;
use crate::types::VersionListing;
use semver::{Version, VersionReq};

const OPERATORS: [&str; 8] = ["~>", "<=", ">=", "<", ">", "=", "^", "~"];

/// Split an `npm:<name>@<range>` alias into the aliased name and its range.
///
/// Non-alias specs are returned unchanged under the declared name.
pub fn split_alias(name: &str, spec: &str) -> (String, String) {
    let spec = spec.trim();
    let Some(target) = spec.strip_prefix("npm:") else {
        return (name.to_string(), spec.to_string());
    };
    if target.is_empty() {
        return (name.to_string(), String::new());
    }
    // A scoped target's leading '@' is not the version separator.
    let (scope, rest) = match target.strip_prefix('@') {
        Some(rest) => ("@", rest),
        None => ("", target),
    };
    match rest.rfind('@') {
        Some(idx) => (
            format!("{}{}", scope, &rest[..idx]),
            rest[idx + 1..].to_string(),
        ),
        None => (target.to_string(), String::new()),
    }
}

/// Pick the concrete version `spec` selects from `listing`.
pub fn select_version(listing: &VersionListing, spec: &str) -> Result<String, RangeError> {
    let spec = spec.trim();
    let name = listing.name.as_str();

    if is_unsupported(spec) {
        return Err(RangeError::Unsupported {
            name: name.to_string(),
            spec: spec.to_string(),
        });
    }

    if let Some(tagged) = listing.dist_tags.get(spec) {
        return Ok(tagged.clone());
    }

    let reqs = match to_version_reqs(spec) {
        Some(reqs) => reqs,
        None if looks_like_tag(spec) => {
            return Err(RangeError::NoMatch {
                name: name.to_string(),
                spec: spec.to_string(),
            })
        }
        None => {
            return Err(RangeError::Unsupported {
                name: name.to_string(),
                spec: spec.to_string(),
            })
        }
    };

    listing
        .versions
        .iter()
        .filter_map(|raw| {
            let parsed = Version::parse(raw.trim_start_matches('v')).ok()?;
            Some((parsed, raw))
        })
        .filter(|(version, _)| reqs.iter().any(|req| req.matches(version)))
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, raw)| raw.clone())
        .ok_or_else(|| RangeError::NoMatch {
            name: name.to_string(),
            spec: spec.to_string(),
        })
}

/// URLs, git and path specs, and GitHub shorthand cannot be matched against a listing.
fn is_unsupported(spec: &str) -> bool {
    spec.contains(':') || spec.contains('/')
}

fn looks_like_tag(spec: &str) -> bool {
    let mut chars = spec.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {
            !matches!(c, 'x' | 'X' | 'v') || chars.next().map_or(true, |n| !n.is_ascii_digit() && n != '.')
        }
        _ => false,
    }
}

/// Rewrite an npm range into semver alternatives. `None` when it does not parse.
pub fn to_version_reqs(spec: &str) -> Option<Vec<VersionReq>> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Some(vec![VersionReq::STAR]);
    }
    spec.split("||").map(|alt| comparator_set(alt.trim())).collect()
}

fn comparator_set(alt: &str) -> Option<VersionReq> {
    if is_wildcard(alt) {
        return Some(VersionReq::STAR);
    }

    if let Some((lower, upper)) = alt.split_once(" - ") {
        let lower = pad_version(strip_v(lower.trim()))?;
        let upper = hyphen_upper(strip_v(upper.trim()))?;
        return VersionReq::parse(&format!(">={}, {}", lower, upper)).ok();
    }

    let mut comparators = Vec::new();
    let mut pending_op: Option<&str> = None;
    for token in alt.split_whitespace() {
        if OPERATORS.contains(&token) {
            pending_op = Some(token);
            continue;
        }
        let token = match pending_op.take() {
            Some(op) => format!("{}{}", op, token),
            None => token.to_string(),
        };
        if let Some(comparator) = normalize_comparator(&token)? {
            comparators.push(comparator);
        }
    }
    if pending_op.is_some() {
        return None;
    }

    if comparators.is_empty() {
        return Some(VersionReq::STAR);
    }
    VersionReq::parse(&comparators.join(", ")).ok()
}

/// Normalize one comparator. `Some(None)` means the comparator matches anything.
fn normalize_comparator(token: &str) -> Option<Option<String>> {
    let op = OPERATORS
        .iter()
        .find(|op| token.starts_with(**op))
        .copied()
        .unwrap_or("");
    let rest = strip_v(&token[op.len()..]);
    let op = if op == "~>" { "~" } else { op };

    if rest.is_empty() || is_wildcard(rest) {
        return Some(None);
    }

    if op.is_empty() || op == "=" {
        if Version::parse(rest).is_ok() {
            return Some(Some(format!("={}", rest)));
        }
        let parts = numeric_prefix(rest)?;
        return Some(Some(format!("{}.*", parts.join("."))));
    }

    if Version::parse(rest).is_ok() {
        return Some(Some(format!("{}{}", op, rest)));
    }
    let parts = numeric_prefix(rest)?;
    Some(Some(format!("{}{}", op, parts.join("."))))
}

/// Leading numeric components of a partial version, stopping at the first wildcard.
fn numeric_prefix(version: &str) -> Option<Vec<&str>> {
    let mut parts = Vec::new();
    for part in version.split('.') {
        if is_wildcard(part) {
            break;
        }
        if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        parts.push(part);
    }
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    Some(parts)
}

fn pad_version(version: &str) -> Option<String> {
    if Version::parse(version).is_ok() {
        return Some(version.to_string());
    }
    let mut parts: Vec<String> = numeric_prefix(version)?
        .into_iter()
        .map(str::to_string)
        .collect();
    while parts.len() < 3 {
        parts.push("0".to_string());
    }
    Some(parts.join("."))
}

/// Upper bound of a hyphen range: inclusive when full, exclusive of the next
/// partial increment otherwise (`1.2` → `<1.3.0`).
fn hyphen_upper(version: &str) -> Option<String> {
    if Version::parse(version).is_ok() {
        return Some(format!("<={}", version));
    }
    let parts: Vec<u64> = numeric_prefix(version)?
        .into_iter()
        .map(|p| p.parse().ok())
        .collect::<Option<_>>()?;
    match parts.as_slice() {
        [major] => Some(format!("<{}.0.0", major.checked_add(1)?)),
        [major, minor] => Some(format!("<{}.{}.0", major, minor.checked_add(1)?)),
        _ => None,
    }
}

fn strip_v(version: &str) -> &str {
    let version = version.trim();
    version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('='))
        .unwrap_or(version)
}

fn is_wildcard(part: &str) -> bool {
    matches!(part, "*" | "x" | "X")
}
