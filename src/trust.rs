//! Host code-signing trust.
//!
//! The guard never parses signatures or certificates itself; it consumes a
//! platform verification primitive through the [`TrustAuthority`] seam and
//! interprets only the four-state result. Each target platform supplies
//! its own adapter. Targets without a native code-signing verifier degrade
//! gracefully: the host is reported [`TrustStatus::Unsigned`], which is an
//! answer, not an error (policy decides what to do with it).

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Trust status of the running executable, computed at most once per run
/// and never cached across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustStatus {
    /// The executable carries a valid signature chained to a trusted root.
    Trusted,
    /// The executable is signed, but the signature or signer is not
    /// trusted (bad digest, blocked publisher, distrusted chain).
    SignedUntrusted,
    /// The executable carries no signature at all. Also the unconditional
    /// answer on platforms without native verification.
    Unsigned,
    /// The verifier itself failed: an ambiguous outcome, distinct from a
    /// definitive Unsigned/SignedUntrusted answer. Never treated as
    /// trusted.
    VerificationError,
}

impl fmt::Display for TrustStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrustStatus::Trusted => "trusted",
            TrustStatus::SignedUntrusted => "signed but untrusted",
            TrustStatus::Unsigned => "unsigned",
            TrustStatus::VerificationError => "trust verification error",
        };
        f.write_str(s)
    }
}

/// The platform signing primitive, as consumed by the verifier.
pub trait TrustAuthority {
    /// Reports the trust status of the executable at `executable`.
    fn verify_host_trust(&self, executable: &Path) -> TrustStatus;
}

/// Default adapter for the build target.
///
/// A Windows adapter would map the WinVerifyTrust outcome onto the four
/// states (success => Trusted; no-signature family => Unsigned; explicit
/// distrust, untrusted subject, bad digest => SignedUntrusted; anything
/// else => VerificationError). On targets without such a primitive the
/// host is always Unsigned.
#[derive(Debug, Default)]
pub struct PlatformTrust;

impl TrustAuthority for PlatformTrust {
    fn verify_host_trust(&self, executable: &Path) -> TrustStatus {
        log::debug!(
            "no code-signing verification on this platform for '{}'",
            executable.display()
        );
        TrustStatus::Unsigned
    }
}

/// Fully qualified path of the running executable, supplied by the
/// environment.
pub fn current_executable_path() -> Result<PathBuf> {
    std::env::current_exe().context("cannot retrieve executable path")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_adapter_degrades_to_unsigned() {
        let status = PlatformTrust.verify_host_trust(Path::new("/bin/true"));
        assert_eq!(status, TrustStatus::Unsigned);
    }

    #[test]
    fn current_executable_path_is_available() {
        assert!(current_executable_path().is_ok());
    }

    #[test]
    fn status_display_names_are_stable() {
        assert_eq!(TrustStatus::Trusted.to_string(), "trusted");
        assert_eq!(
            TrustStatus::VerificationError.to_string(),
            "trust verification error"
        );
    }
}
