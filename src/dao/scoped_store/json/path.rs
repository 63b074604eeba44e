use std::{
    fmt::Write,
    path::{Path, PathBuf},
};

use crate::dao::models::{Scope, StoredEntity};

/// Deterministic file holding the entity table of `scope`.
///
/// Comments live at `{root}/comments/{category}/{item}.json`, leaderboard records at
/// `{root}/leaderboards/{category}/{item}/{leaderboard}.json`.
pub fn scope_file<E: StoredEntity>(root: &Path, scope: &Scope) -> PathBuf {
    let mut path = root.join(E::COLLECTION).join(scope.category.as_str());
    let leaf = match &scope.sub_key {
        Some(sub_key) => {
            path.push(encode_segment(&scope.item_name));
            encode_segment(sub_key)
        }
        None => encode_segment(&scope.item_name),
    };
    path.push(format!("{leaf}.json"));
    path
}

/// Escape a name so it always maps to exactly one path segment.
///
/// ASCII alphanumerics, `-`, `_` and non-leading `.` are kept; every other byte becomes `%XX`.
/// The empty name maps to a lone `%`, which no escaped name can produce.
fn encode_segment(raw: &str) -> String {
    if raw.is_empty() {
        return "%".into();
    }

    let mut out = String::with_capacity(raw.len());
    for (index, byte) in raw.bytes().enumerate() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' => out.push(byte as char),
            b'.' if index > 0 => out.push('.'),
            other => {
                let _ = write!(out, "%{other:02X}");
            }
        }
    }
    out
}
