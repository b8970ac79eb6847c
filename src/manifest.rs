//! The build-time manifest: expected digests for the entry script and its
//! trusted dependency modules.
//!
//! The manifest is produced at packaging time by the build tool and sealed
//! next to the guard executable; the guard only ever reads it. It is loaded
//! once at process start, validated, and immutable thereafter. "Exactly one
//! entry script" holds by construction: the script is its own field rather
//! than a tagged row in the dependency table.

use serde::Deserialize;
use std::{fs, path::Path};

use crate::digest::DIGEST_HEX_LEN;
use crate::errors::ManifestError;

/// Maximum manifest size (1 MB).
const MAX_MANIFEST_BYTES: u64 = 1024 * 1024;

/// Delimiter between segments of a hierarchical artifact name.
pub const NAME_DELIMITER: char = '.';

/// What an artifact is, and therefore how strictly its absence is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// The one entry script. Must always be present and legible.
    Script,
    /// A certified dependency module. May legitimately be uninstalled.
    DependencyModule,
}

/// One verifiable artifact: a hierarchical name and its expected digest.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Artifact {
    /// Hierarchical identifier, segments joined by [`NAME_DELIMITER`]
    /// (e.g. `os.path`).
    pub name: String,

    /// Expected digest as a 40-character hex string.
    #[serde(rename = "sha1")]
    pub expected_digest: String,

    /// Filename the terminal segment is expected to carry on disk.
    /// Defaults to `<terminal segment><source_suffix>`.
    #[serde(default)]
    pub filename: Option<String>,
}

impl Artifact {
    /// Terminal segment of the hierarchical name.
    pub fn terminal_segment(&self) -> &str {
        self.name
            .rsplit(NAME_DELIMITER)
            .next()
            .unwrap_or(&self.name)
    }

    /// The on-disk filename to look for at the terminal resolution step.
    pub fn expected_filename(&self, source_suffix: &str) -> String {
        match &self.filename {
            Some(f) => f.clone(),
            None => format!("{}{}", self.terminal_segment(), source_suffix),
        }
    }
}

/// Filesystem conventions of the hosted runtime, carried in the manifest so
/// the resolver stays runtime-agnostic.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactLayout {
    /// Suffix a module file carries on disk (e.g. `.py`).
    #[serde(default = "default_source_suffix")]
    pub source_suffix: String,

    /// Initializer filename appended when an artifact resolves to a
    /// package directory (e.g. `__init__.py`).
    #[serde(default = "default_package_init")]
    pub package_init: String,
}

fn default_source_suffix() -> String {
    ".py".to_string()
}

fn default_package_init() -> String {
    "__init__.py".to_string()
}

impl Default for ArtifactLayout {
    fn default() -> Self {
        Self {
            source_suffix: default_source_suffix(),
            package_init: default_package_init(),
        }
    }
}

/// The sealed verification manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    /// The one entry script.
    pub script: Artifact,

    /// Certified dependency modules, in verification order.
    #[serde(default)]
    pub modules: Vec<Artifact>,

    /// Runtime filesystem conventions.
    #[serde(flatten)]
    pub layout: ArtifactLayout,

    /// Interpreter command the execution environment hands the verified
    /// script to. `GATECHECK_INTERPRETER` overrides at run time.
    #[serde(default)]
    pub interpreter: Option<String>,

    /// Build-time default policy level name (`OFF`, `WARN`, `NORMAL`,
    /// `MAX`). Absent means `NORMAL`.
    #[serde(default)]
    pub default_level: Option<String>,
}

impl Manifest {
    /// Parses and validates a manifest from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ManifestError> {
        let manifest: Manifest = serde_json::from_slice(bytes)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Loads a manifest from `path` behind the usual defensive read:
    /// symlinks refused, size capped at [`MAX_MANIFEST_BYTES`].
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let unreadable = |reason: String| ManifestError::Unreadable {
            path: path.display().to_string(),
            reason,
        };
        let meta = fs::symlink_metadata(path).map_err(|e| unreadable(e.to_string()))?;
        if meta.file_type().is_symlink() {
            return Err(unreadable("refusing to read symlink".to_string()));
        }
        if meta.len() > MAX_MANIFEST_BYTES {
            return Err(unreadable(format!(
                "{} bytes, max {} bytes",
                meta.len(),
                MAX_MANIFEST_BYTES
            )));
        }
        let bytes = fs::read(path).map_err(|e| unreadable(e.to_string()))?;
        Self::from_slice(&bytes)
    }

    fn validate(&self) -> Result<(), ManifestError> {
        validate_artifact(&self.script)?;
        let mut seen = std::collections::HashSet::new();
        for m in &self.modules {
            validate_artifact(m)?;
            if !seen.insert(m.name.as_str()) {
                return Err(ManifestError::Invalid(format!(
                    "duplicate module entry '{}'",
                    m.name
                )));
            }
        }
        Ok(())
    }
}

fn validate_artifact(a: &Artifact) -> Result<(), ManifestError> {
    if a.name.is_empty() || a.name.split(NAME_DELIMITER).any(str::is_empty) {
        return Err(ManifestError::Invalid(format!(
            "empty name segment in '{}'",
            a.name
        )));
    }
    if a.expected_digest.len() != DIGEST_HEX_LEN
        || !a.expected_digest.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return Err(ManifestError::Invalid(format!(
            "'{}': digest must be {} hex characters",
            a.name, DIGEST_HEX_LEN
        )));
    }
    Ok(())
}
