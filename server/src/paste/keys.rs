use uuid::Uuid;

/// Length of a server-generated paste key.
pub const GENERATED_KEY_LEN: usize = 8;

/// Upper bound for caller-supplied keys accepted over HTTP.
pub const MAX_CUSTOM_KEY_LEN: usize = 64;

/// New random paste key: the first 8 hex chars of a v4 UUID (32 bits).
///
/// Not checked against existing records.
pub fn generate_key() -> String {
    let mut key = Uuid::new_v4().simple().to_string();
    key.truncate(GENERATED_KEY_LEN);
    key
}

/// Whether `key` is usable as a caller-supplied identifier in a URL path.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= MAX_CUSTOM_KEY_LEN
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
