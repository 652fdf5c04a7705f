//! Object key layout.

/// Build the key for an uploaded file: `maps/{namespace}/{millis}_{file_name}`.
///
/// Only the last path component of `file_name` is kept. Two uploads for the
/// same namespace with the same name in the same millisecond collide.
pub fn object_key(namespace: &str, epoch_millis: u128, file_name: &str) -> String {
    format!("maps/{namespace}/{epoch_millis}_{}", base_name(file_name))
}

fn base_name(file_name: &str) -> &str {
    let name = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if name.is_empty() { "unnamed" } else { name }
}
