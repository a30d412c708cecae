//! Formula rewriting: R1C1-relative references and localized function names
//!
//! Formulas are stored in the worksheet part in A1 notation. Callers may use
//! `R[dr]C[dc]` tokens relative to the cell being written (bare digits are
//! absolute, brackets are offsets, either component may be omitted); those
//! are rewritten here. Double-quoted string literals are protected with
//! hash-based placeholder tokens so rewriting never touches literal text.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{cell_address, MAX_COL, MAX_ROW};

static STRING_LIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""[^"]+""#).unwrap());
// A reference token must follow a non-word character; the leading '=' of the
// formula satisfies this for a token in first position.
static REL_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\W)(R\[?(?:-?\d+)?\]?C\[?(?:-?\d+)?\]?)").unwrap());
static TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^R(?:\[(-?\d+)\]|(\d+))?C(?:\[(-?\d+)\]|(\d+))?$").unwrap());

/// Resolve one `R..C..` token against a 1-based base cell.
///
/// Returns `None` when the token does not resolve to an address inside the
/// sheet limits; the caller then leaves the original token text unmodified.
fn resolve_token(token: &str, base_row: u32, base_col: u32) -> Option<String> {
    let caps = TOKEN_RE.captures(token)?;
    let row = component(&caps, 1, 2, base_row)?;
    let col = component(&caps, 3, 4, base_col)?;
    if row < 1 || row > i64::from(MAX_ROW) || col < 1 || col > i64::from(MAX_COL) {
        return None;
    }
    cell_address(row as u32, col as u32)
}

fn component(caps: &regex::Captures<'_>, rel_idx: usize, abs_idx: usize, base: u32) -> Option<i64> {
    if let Some(offset) = caps.get(rel_idx) {
        let offset: i64 = offset.as_str().parse().ok()?;
        Some(i64::from(base) + offset)
    } else if let Some(abs) = caps.get(abs_idx) {
        abs.as_str().parse().ok()
    } else {
        Some(i64::from(base))
    }
}

fn placeholder_mark() -> u64 {
    let mut hasher = DefaultHasher::new();
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos()
        .hash(&mut hasher);
    hasher.finish()
}

/// Rewrite a formula for storage: protect string literals, resolve relative
/// references against the base cell, substitute localized function names,
/// then restore the literals byte-exact.
pub fn translate(
    formula: &str,
    base_row: u32,
    base_col: u32,
    functions: Option<&IndexMap<String, String>>,
) -> String {
    let mut protected: Vec<(String, String)> = Vec::new();
    let mut result = formula.to_string();

    if result.contains('"') {
        let mark = placeholder_mark();
        result = STRING_LIT_RE
            .replace_all(&result, |caps: &regex::Captures<'_>| {
                let literal = caps[0].to_string();
                let mut hasher = DefaultHasher::new();
                literal.hash(&mut hasher);
                let key = format!("<<{:016x}-{:016x}>>", mark, hasher.finish());
                protected.push((key.clone(), literal));
                key
            })
            .into_owned();
    }

    result = REL_REF_RE
        .replace_all(&result, |caps: &regex::Captures<'_>| {
            match resolve_token(&caps[2], base_row, base_col) {
                Some(cell) => format!("{}{}", &caps[1], cell),
                None => caps[0].to_string(),
            }
        })
        .into_owned();

    if let Some(table) = functions {
        if result.contains('(') {
            for (name, name_en) in table {
                let from = format!("{name}(");
                let to = format!("{name_en}(");
                result = result.replace(&from, &to);
            }
        }
    }

    for (key, literal) in &protected {
        result = result.replace(key, literal);
    }

    result
}
