use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

/// Matches a trailing ` (N)` disambiguator on a file stem.
fn disambiguator() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" \((\d+)\)$").expect("disambiguator pattern is valid"))
}

/// Split a file name into stem and extension at the last dot.
///
/// A leading dot does not start an extension (`.env` has no extension).
fn split_name(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}

/// Return a path that does not exist on disk at return time.
///
/// If `desired` is free it is returned unchanged. Otherwise a ` (N)`
/// disambiguator is inserted before the extension; an existing
/// disambiguator is continued from N+1 rather than nested.
///
/// No lock is held between probing and the caller creating the file, so a
/// concurrent writer can still race for the same name.
pub fn resolve(desired: &Path) -> PathBuf {
    if !desired.exists() {
        return desired.to_path_buf();
    }

    let name = desired
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (stem, ext) = split_name(&name);

    let (base, mut next) = match disambiguator().captures(stem) {
        Some(caps) => {
            let start = caps.get(0).map_or(stem.len(), |m| m.start());
            let n = caps[1].parse::<u64>().unwrap_or(0);
            (&stem[..start], n.saturating_add(1))
        }
        None => (stem, 1),
    };

    let dir = desired.parent().unwrap_or_else(|| Path::new(""));
    loop {
        let candidate_name = match ext {
            Some(ext) => format!("{base} ({next}).{ext}"),
            None => format!("{base} ({next})"),
        };
        let candidate = dir.join(candidate_name);
        if !candidate.exists() {
            return candidate;
        }
        next += 1;
    }
}
