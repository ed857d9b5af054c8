/// Known engine diagnostics mapped to friendlier reasons.
///
/// Checked in order against the lowercased stderr; the first match wins.
const KNOWN_DIAGNOSTICS: &[(&str, &str)] = &[
    (
        "missing recipients",
        "Encryption failed: missing public recipient key.",
    ),
    (
        "no matching keys",
        "Decryption failed: please check the identity keys.",
    ),
    (
        "encrypted identity",
        "Decryption failed: identity key is passphrase-protected. Please use an unencrypted key.",
    ),
    (
        "no secrets provided to decrypt the file",
        "Decryption failed: no identity key provided that matches the file.",
    ),
];

/// Turn an engine's stderr and exit code into a user-facing reason.
///
/// Unknown diagnostics are passed through trimmed; an empty diagnostic
/// falls back to the exit code.
pub fn explain(diagnostic: &str, exit_code: Option<i32>) -> String {
    let trimmed = diagnostic.trim();
    if let Some(friendly) = friendly_reason(trimmed) {
        return friendly.to_string();
    }
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    match exit_code {
        Some(code) => format!("engine exited with code {code}"),
        None => "engine was terminated by a signal".to_string(),
    }
}

/// Look up a friendly reason for a known diagnostic.
pub fn friendly_reason(diagnostic: &str) -> Option<&'static str> {
    let lower = diagnostic.to_lowercase();
    KNOWN_DIAGNOSTICS
        .iter()
        .find(|(pattern, _)| lower.contains(pattern))
        .map(|(_, reason)| *reason)
}
