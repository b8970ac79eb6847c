//! Hierarchical artifact-name resolution against ordered search roots.
//!
//! This mirrors how the hosting runtime locates packages, restated as a
//! generic ordered-search resolver. The two rules that matter:
//!
//! 1. **First match wins, by root order.** Roots are consulted strictly in
//!    the order supplied; the first root containing the wanted segment
//!    shadows every later root. Duplicate names across roots therefore
//!    resolve deterministically.
//! 2. **Package-scoped shadowing.** Once a non-terminal segment matches a
//!    package directory, that directory becomes the *only* root for deeper
//!    segments; sibling roots are never consulted again.
//!
//! Membership is tested against exact names (no directory enumeration),
//! so the OS's readdir ordering cannot influence the result.

use std::path::{Path, PathBuf};

use crate::manifest::{Artifact, ArtifactLayout, NAME_DELIMITER};

/// Resolves `artifact` to a concrete file path, or `None` if any segment
/// fails to match (never a partial path).
///
/// Non-terminal segments match subdirectories only. The terminal segment
/// matches either the artifact's expected filename as a file or a package
/// subdirectory of the segment's name; a directory match appends the
/// layout's package initializer.
///
/// Precondition: the artifact name is non-empty (manifest validation
/// guarantees this for manifest-borne artifacts).
pub fn resolve(
    artifact: &Artifact,
    search_roots: &[PathBuf],
    layout: &ArtifactLayout,
) -> Option<PathBuf> {
    assert!(!artifact.name.is_empty(), "artifact name must be non-empty");

    let segments: Vec<&str> = artifact.name.split(NAME_DELIMITER).collect();
    let filename = artifact.expected_filename(&layout.source_suffix);

    // Current root set: all supplied roots at first, collapsing to the one
    // matched package directory as soon as a non-terminal segment matches.
    let mut package_root: Option<PathBuf> = None;

    let (&terminal, parents) = segments.split_last()?;

    for &segment in parents {
        let matched = match &package_root {
            Some(root) => match_subdir(root, segment),
            None => search_roots.iter().find_map(|r| match_subdir(r, segment)),
        };
        package_root = Some(matched?);
    }

    match &package_root {
        Some(root) => match_terminal(root, terminal, &filename, layout),
        None => search_roots
            .iter()
            .find_map(|r| match_terminal(r, terminal, &filename, layout)),
    }
}

fn match_subdir(root: &Path, segment: &str) -> Option<PathBuf> {
    let candidate = root.join(segment);
    candidate.is_dir().then_some(candidate)
}

fn match_terminal(
    root: &Path,
    segment: &str,
    filename: &str,
    layout: &ArtifactLayout,
) -> Option<PathBuf> {
    let as_file = root.join(filename);
    if as_file.is_file() {
        return Some(as_file);
    }
    let as_package = root.join(segment);
    if as_package.is_dir() {
        return Some(as_package.join(&layout.package_init));
    }
    None
}
