//! Markdown vault storage
//!
//! Notes are plain markdown files under a vault root. Only the frontmatter
//! block is ever rewritten: field updates land in the parsed mapping, keys
//! keep their order, and the body is carried over byte-for-byte. Writes go
//! through a temp file and rename.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

use crate::domain::{Frontmatter, NoteKey};
use crate::sync::{FieldWrite, NoteSink, NoteSource};

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Note has no frontmatter: {0}")]
    NoFrontmatter(NoteKey),

    #[error("Path is outside the vault: {0}")]
    OutsideVault(PathBuf),
}

/// A directory of markdown notes
#[derive(Debug, Clone)]
pub struct MarkdownVault {
    root: PathBuf,
}

impl MarkdownVault {
    /// Opens a vault at the given root; no layout is required or created
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a note
    pub fn note_path(&self, key: &NoteKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    /// Turns a user-supplied or event path into a vault key
    ///
    /// Absolute paths must point inside the vault; when the spelling does
    /// not match the root, the canonical form is tried before giving up.
    /// Relative paths are taken as vault-relative. Paths that climb out
    /// with `..` are rejected. Separators are normalized to `/`.
    pub fn key_for(&self, path: &Path) -> Result<NoteKey, VaultError> {
        let resolved;
        let rel = if path.is_absolute() {
            match path.strip_prefix(&self.root) {
                Ok(rel) => rel,
                Err(_) => {
                    resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
                    resolved
                        .strip_prefix(&self.root)
                        .map_err(|_| VaultError::OutsideVault(path.to_path_buf()))?
                }
            }
        } else {
            path
        };
        if rel.components().any(|c| c == Component::ParentDir) {
            return Err(VaultError::OutsideVault(path.to_path_buf()));
        }
        Ok(NoteKey::new(joined_components(rel)))
    }

    /// Whether a filesystem path names a note this vault cares about:
    /// an `.md` file inside the root with no hidden path component
    pub fn is_note_path(&self, path: &Path) -> bool {
        if !path.extension().is_some_and(|ext| ext == "md") {
            return false;
        }
        let Ok(rel) = path.strip_prefix(&self.root) else {
            return false;
        };
        !rel.components()
            .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
    }

    /// Lists every note in the vault, sorted by key
    ///
    /// Hidden files and directories (leading `.`) are skipped, which keeps
    /// editor and tool state out of batch runs.
    pub fn list_notes(&self) -> Result<Vec<NoteKey>> {
        let mut keys = Vec::new();
        if !self.root.exists() {
            return Ok(keys);
        }

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| !is_hidden(entry));
        for entry in walker {
            let entry = entry
                .with_context(|| format!("Failed to walk vault: {}", self.root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().is_some_and(|ext| ext == "md") {
                if let Ok(key) = self.key_for(entry.path()) {
                    keys.push(key);
                }
            }
        }

        keys.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(keys)
    }
}

impl NoteSource for MarkdownVault {
    fn frontmatter(&self, key: &NoteKey) -> Result<Option<Frontmatter>> {
        let path = self.note_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read note: {}", path.display()))?;
        Ok(parse_frontmatter(&content))
    }
}

impl NoteSink for MarkdownVault {
    fn apply_fields(&self, key: &NoteKey, writes: &[FieldWrite]) -> Result<()> {
        let path = self.note_path(key);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read note: {}", path.display()))?;

        let (yaml, body) =
            split_frontmatter(&content).ok_or_else(|| VaultError::NoFrontmatter(key.clone()))?;
        let mut frontmatter =
            mapping_from_yaml(yaml).ok_or_else(|| VaultError::NoFrontmatter(key.clone()))?;

        for write in writes {
            frontmatter.set(&write.name, write.value.clone());
        }

        let rendered = render_note(&frontmatter, body)?;
        write_atomic(&path, &rendered)
    }
}

/// Splits a note into its frontmatter YAML and everything after the
/// closing delimiter line
///
/// The block is a leading `---` line up to the next line that reads `---`.
/// The body slice starts right after the closing line and is never trimmed.
fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let after_open = content
        .strip_prefix("---")
        .and_then(|rest| rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n')))?;

    let mut offset = 0;
    for line in after_open.split_inclusive('\n') {
        if line.trim_end_matches(['\n', '\r']) == "---" {
            let yaml = &after_open[..offset];
            let body = &after_open[offset + line.len()..];
            return Some((yaml, body));
        }
        offset += line.len();
    }
    None
}

/// Parses frontmatter YAML into an ordered field map
///
/// Anything that is not a mapping (including YAML that fails to parse)
/// counts as "no metadata"; an empty block is an empty map.
fn mapping_from_yaml(yaml: &str) -> Option<Frontmatter> {
    if yaml.trim().is_empty() {
        return Some(Frontmatter::new());
    }
    match serde_yaml::from_str::<serde_yaml::Value>(yaml) {
        Ok(serde_yaml::Value::Mapping(mapping)) => Some(Frontmatter::from_mapping(mapping)),
        _ => None,
    }
}

fn parse_frontmatter(content: &str) -> Option<Frontmatter> {
    let (yaml, _) = split_frontmatter(content)?;
    mapping_from_yaml(yaml)
}

fn render_note(frontmatter: &Frontmatter, body: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(frontmatter.as_mapping())
        .context("Failed to serialize frontmatter")?;

    let mut content = String::with_capacity(yaml.len() + body.len() + 8);
    content.push_str("---\n");
    content.push_str(&yaml);
    content.push_str("---\n");
    content.push_str(body);
    Ok(content)
}

/// Writes via a temp file and rename, so a crash never leaves a half note
fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let temp_path = path.with_extension("md.tmp");

    fs::write(&temp_path, content)
        .with_context(|| format!("Failed to write temp file: {}", temp_path.display()))?;

    fs::rename(&temp_path, path).with_context(|| {
        format!(
            "Failed to rename {} to {}",
            temp_path.display(),
            path.display()
        )
    })?;

    Ok(())
}

/// Joins path components with `/` so keys compare the same on every platform
fn joined_components(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}
