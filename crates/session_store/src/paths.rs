use std::path::PathBuf;

/// Key prefix shared by every persisted snapshot.
pub const STORAGE_PREFIX: &str = "interview_session_";

pub const STORE_DIR: [&str; 2] = ["interview_client", "sessions"];

/// Per-user data directory, falling back to the working directory when the
/// platform has none.
#[must_use]
pub fn default_store_root() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(STORE_DIR[0])
        .join(STORE_DIR[1])
}

/// Escapes every byte outside `[A-Za-z0-9_-]` as `%XX`, so distinct ids
/// never share a file and no id can leave the store directory.
#[must_use]
pub fn escape_session_id_for_filename(session_id: &str) -> String {
    let mut escaped = String::with_capacity(session_id.len());
    for byte in session_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            escaped.push(char::from(byte));
        } else {
            escaped.push_str(&format!("%{byte:02X}"));
        }
    }
    escaped
}

#[must_use]
pub fn snapshot_file_name(session_id: &str) -> String {
    format!(
        "{STORAGE_PREFIX}{}.json",
        escape_session_id_for_filename(session_id)
    )
}
