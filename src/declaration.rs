//! Version declarations embedded in project files.
//!
//! A declaration is a `key = "value"` (or `key = 'value'`) assignment on its
//! own line. Files are read fresh on every call; nothing is cached.

use regex::{Captures, Regex};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{ReleaseError, Result};

/// A single `field = "value"` found in a project file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDeclaration {
    pub file: PathBuf,
    pub field: String,
    pub value: String,
}

/// Line-anchored `field = "value"` pattern; CRLF mode keeps `\r\n` endings out of the match
fn field_regex(field: &str) -> Option<Regex> {
    let pattern = format!(
        r#"(?mR)^([ \t]*{}[ \t]*=[ \t]*)(?:"([^"\r\n]*)"|'([^'\r\n]*)')([ \t]*(?:#.*)?)$"#,
        regex::escape(field)
    );
    Regex::new(&pattern).ok()
}

fn captured_value<'a>(captures: &Captures<'a>) -> Option<&'a str> {
    captures
        .get(2)
        .or_else(|| captures.get(3))
        .map(|m| m.as_str())
}

/// Extract the first value assigned to `field`
pub fn extract_field(content: &str, field: &str) -> Option<String> {
    field_regex(field)?
        .captures(content)
        .and_then(|c| captured_value(&c).map(str::to_string))
}

/// Replace the first value assigned to `field`, keeping quote style and layout
///
/// Returns `None` when the field is not declared.
pub fn replace_field(content: &str, field: &str, new_value: &str) -> Option<String> {
    let re = field_regex(field)?;
    let captures = re.captures(content)?;
    let whole = captures.get(0)?;
    let quote = if captures.get(2).is_some() { '"' } else { '\'' };
    let prefix = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    let suffix = captures.get(4).map(|m| m.as_str()).unwrap_or_default();

    let mut updated = String::with_capacity(content.len() + new_value.len());
    updated.push_str(&content[..whole.start()]);
    updated.push_str(prefix);
    updated.push(quote);
    updated.push_str(new_value);
    updated.push(quote);
    updated.push_str(suffix);
    updated.push_str(&content[whole.end()..]);
    Some(updated)
}

/// A project file holding one or more declarations
#[derive(Debug, Clone)]
pub struct DeclarationFile {
    path: PathBuf,
    content: String,
}

impl DeclarationFile {
    /// Read the file, mapping a missing file to [`ReleaseError::FileNotFound`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ReleaseError::FileNotFound(path.to_path_buf()),
            _ => ReleaseError::Io(e),
        })?;
        Ok(DeclarationFile {
            path: path.to_path_buf(),
            content,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Look up a declared field
    pub fn field(&self, field: &str) -> Result<VersionDeclaration> {
        extract_field(&self.content, field)
            .map(|value| VersionDeclaration {
                file: self.path.clone(),
                field: field.to_string(),
                value,
            })
            .ok_or_else(|| ReleaseError::MissingField {
                field: field.to_string(),
                path: self.path.clone(),
            })
    }

    /// Update a declared field in memory
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<()> {
        let updated =
            replace_field(&self.content, field, value).ok_or_else(|| ReleaseError::MissingField {
                field: field.to_string(),
                path: self.path.clone(),
            })?;
        self.content = updated;
        Ok(())
    }

    /// Overwrite the file on disk with the current content
    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, &self.content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PYPROJECT: &str = r#"[project]
name = "harbor"
version = "0.1.0"
requires-python = ">=3.11"

[tool.ruff]
target-version = "py311"
"#;

    #[test]
    fn test_extract_from_manifest() {
        assert_eq!(extract_field(PYPROJECT, "version"), Some("0.1.0".to_string()));
        assert_eq!(extract_field(PYPROJECT, "missing"), None);
    }

    #[test]
    fn test_prefixed_keys_do_not_match() {
        let content = "target-version = \"py311\"\n";
        assert_eq!(extract_field(content, "version"), None);
    }

    #[test]
    fn test_single_quotes_and_whitespace() {
        let content = "  __version__   =   '0.2.0-rc.1'  \n__milestone__='M1' # current\n";
        assert_eq!(
            extract_field(content, "__version__"),
            Some("0.2.0-rc.1".to_string())
        );
        assert_eq!(extract_field(content, "__milestone__"), Some("M1".to_string()));
    }

    #[test]
    fn test_value_is_verbatim() {
        let content = "version = \" 1.0 \"\n";
        assert_eq!(extract_field(content, "version"), Some(" 1.0 ".to_string()));
    }

    #[test]
    fn test_replace_keeps_layout() {
        let updated = replace_field(PYPROJECT, "version", "0.2.0").unwrap();
        assert!(updated.contains("version = \"0.2.0\"\n"));
        assert!(updated.contains("target-version = \"py311\""));
        assert_eq!(updated.len(), PYPROJECT.len());

        let content = "__milestone__ = 'M0'  # stage\n";
        let updated = replace_field(content, "__milestone__", "M1").unwrap();
        assert_eq!(updated, "__milestone__ = 'M1'  # stage\n");
    }

    #[test]
    fn test_crlf_line_endings() {
        let content = "[project]\r\nversion = \"0.1.0\"  # pinned\r\nname = 'harbor'\r\n";
        assert_eq!(extract_field(content, "version"), Some("0.1.0".to_string()));
        assert_eq!(extract_field(content, "name"), Some("harbor".to_string()));

        let updated = replace_field(content, "version", "0.2.0").unwrap();
        assert_eq!(
            updated,
            "[project]\r\nversion = \"0.2.0\"  # pinned\r\nname = 'harbor'\r\n"
        );
    }

    #[test]
    fn test_replace_missing_field() {
        assert_eq!(replace_field("name = \"x\"\n", "version", "1.0.0"), None);
    }

    #[test]
    fn test_load_missing_file() {
        let err = DeclarationFile::load("/definitely/not/here/pyproject.toml").unwrap_err();
        assert!(matches!(err, ReleaseError::FileNotFound(_)));
    }
}
