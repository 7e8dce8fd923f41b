//! `.env` loading.
//!
//! Must run before the async runtime starts: it mutates the process
//! environment. Variables that are already set are never overwritten.

use std::path::Path;

use anyhow::Context;

/// Loads `path` into the process environment. A missing file is not an error.
///
/// Parsing follows the usual dotenv rules (quoting, escapes, `export`
/// prefixes, `#` comments). Returns the number of variables set.
pub fn load(path: &Path) -> anyhow::Result<usize> {
    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(e) if e.not_found() => return Ok(0),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read env file {}", path.display()))
        }
    };

    let mut applied = 0;
    for entry in entries {
        let (key, value) =
            entry.with_context(|| format!("failed to parse env file {}", path.display()))?;
        if std::env::var_os(&key).is_none() {
            std::env::set_var(&key, value);
            applied += 1;
        }
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_env(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_missing_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load(&dir.path().join("absent.env")).unwrap(), 0);
    }

    #[test]
    fn test_inline_comments_quotes_and_exports() {
        let (_dir, path) = write_env(concat!(
            "# DashScope\n",
            "QWEN_EXTRACT_ENV_TEST_KEY=sk-123 # prod key\n",
            "QWEN_EXTRACT_ENV_TEST_ESCAPED=\"a\\\"b\"\n",
            "export QWEN_EXTRACT_ENV_TEST_URL='https://x/v1'\n",
            "QWEN_EXTRACT_ENV_TEST_LINES=\"one\\ntwo\"\n",
            "\n",
        ));

        assert_eq!(load(&path).unwrap(), 4);
        assert_eq!(std::env::var("QWEN_EXTRACT_ENV_TEST_KEY").unwrap(), "sk-123");
        assert_eq!(std::env::var("QWEN_EXTRACT_ENV_TEST_ESCAPED").unwrap(), "a\"b");
        assert_eq!(std::env::var("QWEN_EXTRACT_ENV_TEST_URL").unwrap(), "https://x/v1");
        assert_eq!(std::env::var("QWEN_EXTRACT_ENV_TEST_LINES").unwrap(), "one\ntwo");
    }

    #[test]
    fn test_existing_variables_win() {
        let (_dir, path) = write_env(
            "QWEN_EXTRACT_ENV_FILE_TEST_SET=from-file\nQWEN_EXTRACT_ENV_FILE_TEST_NEW=new\n",
        );
        std::env::set_var("QWEN_EXTRACT_ENV_FILE_TEST_SET", "from-process");

        assert_eq!(load(&path).unwrap(), 1);
        assert_eq!(std::env::var("QWEN_EXTRACT_ENV_FILE_TEST_SET").unwrap(), "from-process");
        assert_eq!(std::env::var("QWEN_EXTRACT_ENV_FILE_TEST_NEW").unwrap(), "new");
    }

    #[test]
    fn test_malformed_line_is_an_error() {
        let (_dir, path) = write_env("QWEN_EXTRACT_ENV_TEST_BAD=two words\n");
        assert!(load(&path).is_err());
    }
}
