//! Policy levels and the proceed/abort decision function.
//!
//! The decision function is pure: identical inputs always yield the same
//! [`Decision`], with no hidden state and no I/O. All tolerance rules live
//! here in one place so the orchestrator never improvises.
//!
//! One inherited asymmetry is preserved deliberately: host trust is
//! consulted at `Warn` (for reporting) and `Max` (decisively), never at
//! `Normal`, while digest checks run uniformly at `Warn`, `Normal`, and
//! `Max`. Correcting it would change the security model.

use std::fmt;

use crate::trust::TrustStatus;

/// Configured strictness, resolved once before verification and immutable
/// afterward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PolicyLevel {
    /// Verification is skipped entirely: no digests, no resolver calls,
    /// no trust query.
    Disabled = 0,
    /// All checks run and are reported; the outcome is always proceed.
    Warn = 1,
    /// Tamper aborts; a missing or unreadable optional dependency is
    /// tolerated as "not installed".
    Normal = 2,
    /// Normal's digest rule, plus the host executable must be trusted.
    Max = 3,
}

impl PolicyLevel {
    /// Case-sensitive level names used by the environment override and
    /// the manifest's build-time default.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "OFF" => Some(PolicyLevel::Disabled),
            "WARN" => Some(PolicyLevel::Warn),
            "NORMAL" => Some(PolicyLevel::Normal),
            "MAX" => Some(PolicyLevel::Max),
            _ => None,
        }
    }

    /// Whether this level queries the host trust authority at all.
    pub fn checks_host_trust(self) -> bool {
        matches!(self, PolicyLevel::Warn | PolicyLevel::Max)
    }
}

impl fmt::Display for PolicyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PolicyLevel::Disabled => "OFF",
            PolicyLevel::Warn => "WARN",
            PolicyLevel::Normal => "NORMAL",
            PolicyLevel::Max => "MAX",
        };
        f.write_str(s)
    }
}

/// Result of verifying one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// On-disk digest equals the manifest digest.
    Matched,
    /// On-disk digest differs: the primary tamper signal.
    Mismatched,
    /// No search root yielded the artifact.
    NotFound,
    /// The artifact resolved but could not be read.
    IoError,
}

/// Terminal output of one verification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Hand control to the execution environment.
    Proceed,
    /// The load/run entry point must never be invoked.
    Abort,
}

/// Resolves the effective policy level from layered sources: build-time
/// default, then the environment's named override, then the command-line
/// override (highest precedence).
///
/// An unrecognized environment value is reported and leaves the level
/// unchanged; it never escalates or relaxes policy by accident.
pub fn resolve_level(
    default: PolicyLevel,
    env_value: Option<&str>,
    cli_override: Option<PolicyLevel>,
) -> PolicyLevel {
    let mut level = default;
    if let Some(value) = env_value {
        match PolicyLevel::from_name(value) {
            Some(l) => level = l,
            None => log::warn!("unrecognized environment security setting '{value}'"),
        }
    }
    if let Some(l) = cli_override {
        level = l;
    }
    level
}

fn script_tampered(script: VerificationOutcome) -> bool {
    // The entry point must always be present and legible: NotFound and
    // IoError on the script are equivalent to Mismatched.
    script != VerificationOutcome::Matched
}

fn any_dependency_tampered(deps: &[VerificationOutcome]) -> bool {
    // NotFound / IoError on a dependency means "not installed", which is
    // tolerated; only a digest mismatch is decisive.
    deps.iter().any(|o| *o == VerificationOutcome::Mismatched)
}

/// Maps policy level, verification outcomes, and host trust to the final
/// decision. Pure and total: `Disabled` is short-circuited upstream (no
/// checks are even issued), but this function still answers for it.
pub fn decide(
    level: PolicyLevel,
    script: VerificationOutcome,
    dependencies: &[VerificationOutcome],
    trust: TrustStatus,
) -> Decision {
    match level {
        PolicyLevel::Disabled | PolicyLevel::Warn => Decision::Proceed,
        PolicyLevel::Normal => {
            if script_tampered(script) || any_dependency_tampered(dependencies) {
                Decision::Abort
            } else {
                Decision::Proceed
            }
        }
        PolicyLevel::Max => {
            if trust != TrustStatus::Trusted
                || script_tampered(script)
                || any_dependency_tampered(dependencies)
            {
                Decision::Abort
            } else {
                Decision::Proceed
            }
        }
    }
}
