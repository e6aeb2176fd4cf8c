//! Shared test setup for tests that talk to real backends.
//!
//! Unit tests run against in-memory stores and need none of this. Tests that
//! reach Redis or PostgreSQL read their URLs from `.env_test` (falling back to
//! `.env`) and are `#[ignore]`d by default.

use std::sync::Once;

/// Load the test environment once per test binary.
///
/// Also removes a leftover SQLite file named by `SESSION_TEST_SQLITE_URL`, so
/// file-backed runs start from an empty table.
pub(crate) fn init_test_environment() {
    static ENV_INIT: Once = Once::new();
    ENV_INIT.call_once(|| {
        if dotenvy::from_filename(".env_test").is_err() {
            dotenvy::dotenv().ok();
        }

        if let Some(db_path) = std::env::var("SESSION_TEST_SQLITE_URL")
            .ok()
            .and_then(|url| extract_sqlite_file_path_from_url(&url))
        {
            // Missing file is fine
            let _ = std::fs::remove_file(&db_path);
        }
    });
}

/// File path of a `sqlite:` URL, `None` for in-memory databases and other schemes.
fn extract_sqlite_file_path_from_url(url: &str) -> Option<String> {
    let path = url.strip_prefix("sqlite:")?;

    let path = match path.strip_prefix("file:") {
        Some(file_path) => file_path.split('?').next()?,
        None => path.strip_prefix("//").unwrap_or(path).split('?').next()?,
    };

    if path.is_empty() || path.contains(":memory:") {
        return None;
    }
    Some(path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_sqlite_file_path_from_url() {
        assert_eq!(
            extract_sqlite_file_path_from_url("sqlite:/tmp/test.db"),
            Some("/tmp/test.db".to_string())
        );
        assert_eq!(
            extract_sqlite_file_path_from_url("sqlite:./test.db"),
            Some("./test.db".to_string())
        );
        assert_eq!(
            extract_sqlite_file_path_from_url("sqlite:file:/tmp/test.db?mode=rwc"),
            Some("/tmp/test.db".to_string())
        );
        assert_eq!(
            extract_sqlite_file_path_from_url("sqlite:///tmp/test.db"),
            Some("/tmp/test.db".to_string())
        );
        assert_eq!(extract_sqlite_file_path_from_url("sqlite::memory:"), None);
        assert_eq!(
            extract_sqlite_file_path_from_url("sqlite:file::memory:?cache=shared"),
            None
        );
        assert_eq!(extract_sqlite_file_path_from_url("postgres://localhost"), None);
    }
}
