//! Error types for the configuration stage.
//!
//! Verification failures are *outcomes*, not errors: a tampered or missing
//! artifact flows through [`crate::policy::VerificationOutcome`] into the
//! decision function. The types here cover what can go wrong before a
//! verification pass is even allowed to start, and they are always fatal
//! at that stage: a guard with an unparseable policy flag or an invalid
//! manifest must never fall through to running the application.

use std::fmt;

/// A policy-selection flag the guard refuses to interpret.
///
/// Any argument carrying the reserved security prefix that is not one of
/// the recognized forms is a usage error, never silently forwarded to the
/// hosted application: a typo in a security flag must not quietly run at
/// the default policy level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The offending argument, as received.
    pub argument: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid security setting '{}', valid choices are \
             --SECURITY(OFF|WARN|NORMAL|MAX)",
            self.argument
        )
    }
}

impl std::error::Error for ConfigError {}

/// The manifest could not be loaded or fails validation.
#[derive(Debug)]
pub enum ManifestError {
    /// The manifest file could not be read (missing, oversized, symlink).
    Unreadable {
        /// Path the guard attempted to read.
        path: String,
        /// Underlying reason.
        reason: String,
    },

    /// The manifest bytes are not valid JSON for the manifest schema.
    Malformed(serde_json::Error),

    /// The manifest parsed but violates a structural invariant.
    Invalid(String),
}

impl fmt::Display for ManifestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestError::Unreadable { path, reason } => {
                write!(f, "cannot read manifest {path}: {reason}")
            }
            ManifestError::Malformed(e) => write!(f, "malformed manifest: {e}"),
            ManifestError::Invalid(msg) => write!(f, "invalid manifest: {msg}"),
        }
    }
}

impl std::error::Error for ManifestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ManifestError::Malformed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ManifestError {
    fn from(e: serde_json::Error) -> Self {
        ManifestError::Malformed(e)
    }
}
