use std::path::{Path, PathBuf};

use serde::Deserialize;

use awl::ParserOptions;

pub const CONFIG_FILE: &str = "awl.toml";

/// Contents of an `awl.toml` project file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    pub parser: ParserOptions,
}

impl ProjectConfig {
    pub fn from_toml(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|e| format!("TOML parse error: {}", e))
    }

    /// Load the explicit config file, or `awl.toml` next to `near` if one exists.
    /// A missing implicit file yields the defaults; a missing explicit one is an error.
    pub fn load(explicit: Option<&Path>, near: &Path) -> Result<Self, String> {
        let (path, required) = match explicit {
            Some(path) => (path.to_path_buf(), true),
            None => (implicit_path(near), false),
        };

        if !required && !path.is_file() {
            return Ok(ProjectConfig::default());
        }

        let text = std::fs::read_to_string(&path)
            .map_err(|e| format!("cannot read '{}': {}", path.display(), e))?;
        tracing::debug!(config = %path.display(), "loaded project config");
        Self::from_toml(&text).map_err(|e| format!("{}: {}", path.display(), e))
    }
}

fn implicit_path(near: &Path) -> PathBuf {
    let dir = if near.is_dir() {
        near
    } else {
        near.parent().unwrap_or_else(|| Path::new("."))
    };
    dir.join(CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use awl::Encoding;

    #[test]
    fn empty_file_gives_defaults() {
        let config = ProjectConfig::from_toml("").unwrap();
        assert_eq!(config.parser, ParserOptions::default());
    }

    #[test]
    fn parser_table_is_read() {
        let config = ProjectConfig::from_toml(
            "[parser]\nencoding = \"utf-8\"\nrequire-block-end = true\n",
        )
        .unwrap();
        assert_eq!(config.parser.encoding, Encoding::Utf8);
        assert!(config.parser.require_block_end);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ProjectConfig::from_toml("[parser]\nstrict = true\n").is_err());
        assert!(ProjectConfig::from_toml("[linker]\n").is_err());
    }

    #[test]
    fn implicit_config_next_to_source() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("main.awl");
        std::fs::write(&source, "NOP 0\n").unwrap();

        let config = ProjectConfig::load(None, &source).unwrap();
        assert_eq!(config.parser, ParserOptions::default());

        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[parser]\nencoding = \"ascii\"\n",
        )
        .unwrap();
        let config = ProjectConfig::load(None, &source).unwrap();
        assert_eq!(config.parser.encoding, Encoding::Ascii);
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = ProjectConfig::load(Some(&missing), dir.path()).unwrap_err();
        assert!(err.contains("cannot read"), "{}", err);
    }
}
