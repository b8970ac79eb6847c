//! The verification orchestrator: one strictly sequential pass per
//! process run.
//!
//! Sequence: host trust (only when the level consults it), then the entry
//! script, then each manifest dependency in order. Under `Warn` every
//! check runs to completion before the decision is rendered. Under
//! `Normal`/`Max` the pass stops issuing further dependency checks once
//! abort is already inevitable, but every finding produced up to that
//! point has been reported by then; reporting is never skipped for the
//! sake of an early exit. `Disabled` short-circuits before any I/O: no
//! digests, no resolver calls, no trust query.

use std::path::{Path, PathBuf};

use crate::digest;
use crate::manifest::{Artifact, Manifest};
use crate::policy::{self, Decision, PolicyLevel, VerificationOutcome};
use crate::resolve;
use crate::trust::{TrustAuthority, TrustStatus};

/// What one artifact check produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    /// The artifact's hierarchical name.
    pub name: String,
    /// Concrete path the check ran against, when resolution succeeded.
    pub path: Option<PathBuf>,
    /// The verification outcome.
    pub outcome: VerificationOutcome,
}

/// Everything one verification pass observed, plus the rendered decision.
#[derive(Debug)]
pub struct Report {
    /// Effective policy level of the pass.
    pub level: PolicyLevel,
    /// Host trust, when the level consults it.
    pub trust: Option<TrustStatus>,
    /// Entry-script finding. `None` only when verification was disabled.
    pub script: Option<Finding>,
    /// Dependency findings, in manifest order, up to the point the pass
    /// stopped.
    pub dependencies: Vec<Finding>,
    /// Dependencies never checked because abort was already inevitable.
    pub skipped_dependencies: usize,
    /// The terminal decision.
    pub decision: Decision,
}

/// One-shot verifier over an immutable manifest and root set.
pub struct Verifier<'a> {
    manifest: &'a Manifest,
    search_roots: &'a [PathBuf],
    authority: &'a dyn TrustAuthority,
}

impl<'a> Verifier<'a> {
    pub fn new(
        manifest: &'a Manifest,
        search_roots: &'a [PathBuf],
        authority: &'a dyn TrustAuthority,
    ) -> Self {
        Verifier {
            manifest,
            search_roots,
            authority,
        }
    }

    /// Runs the verification pass at `level` for the process hosted at
    /// `executable`.
    pub fn run(&self, level: PolicyLevel, executable: &Path) -> Report {
        if level == PolicyLevel::Disabled {
            log::warn!("SECURITY DISABLED");
            return Report {
                level,
                trust: None,
                script: None,
                dependencies: Vec::new(),
                skipped_dependencies: 0,
                decision: Decision::Proceed,
            };
        }

        // Host trust, consulted at Warn (reported) and Max (decisive).
        let trust = level.checks_host_trust().then(|| {
            let status = self.authority.verify_host_trust(executable);
            match status {
                TrustStatus::Trusted => {
                    log::info!("'{}' carries a trusted signature", executable.display());
                }
                TrustStatus::SignedUntrusted => {
                    log::error!(
                        "SECURITY VIOLATION: '{}' has an untrusted signature",
                        executable.display()
                    );
                }
                TrustStatus::Unsigned => {
                    log::warn!("SECURITY WARNING: '{}' not signed", executable.display());
                }
                TrustStatus::VerificationError => {
                    log::error!(
                        "SECURITY FAILURE: could not verify '{}'",
                        executable.display()
                    );
                }
            }
            status
        });
        let effective_trust = trust.unwrap_or(TrustStatus::Unsigned);

        // Entry script, located beside the executable. Its absence is as
        // fatal as tampering: the entry point must always be present and
        // legible.
        let script_path = executable
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(
                self.manifest
                    .script
                    .expected_filename(&self.manifest.layout.source_suffix),
            );
        let script = self.check_file(&self.manifest.script, &script_path);

        // Dependencies, in manifest order. Stop issuing checks once abort
        // is inevitable at a decisive level.
        let mut dependencies = Vec::new();
        let mut skipped = 0;
        for module in &self.manifest.modules {
            let decisive = level >= PolicyLevel::Normal;
            let inevitable = policy::decide(
                level,
                script.outcome,
                &outcomes(&dependencies),
                effective_trust,
            ) == Decision::Abort;
            if decisive && inevitable {
                skipped += 1;
                continue;
            }
            dependencies.push(self.check_dependency(module));
        }
        if skipped > 0 {
            log::debug!("{skipped} dependency check(s) skipped: abort already decided");
        }

        let decision = policy::decide(
            level,
            script.outcome,
            &outcomes(&dependencies),
            effective_trust,
        );

        Report {
            level,
            trust,
            script: Some(script),
            dependencies,
            skipped_dependencies: skipped,
            decision,
        }
    }

    fn check_dependency(&self, module: &Artifact) -> Finding {
        match resolve::resolve(module, self.search_roots, &self.manifest.layout) {
            Some(path) => {
                log::debug!("found module {} -> {}", module.name, path.display());
                self.check_file(module, &path)
            }
            None => {
                log::info!("module {} not installed", module.name);
                Finding {
                    name: module.name.clone(),
                    path: None,
                    outcome: VerificationOutcome::NotFound,
                }
            }
        }
    }

    fn check_file(&self, artifact: &Artifact, path: &Path) -> Finding {
        let outcome = match digest::compute_digest(path) {
            Ok(detected) => {
                if digest::digests_equal(&detected, &artifact.expected_digest) {
                    VerificationOutcome::Matched
                } else {
                    log::error!(
                        "SECURITY VIOLATION: '{}' has been tampered with!",
                        path.display()
                    );
                    log::debug!(
                        "expected {}, detected {detected}",
                        artifact.expected_digest
                    );
                    VerificationOutcome::Mismatched
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("'{}' missing: {e}", path.display());
                VerificationOutcome::NotFound
            }
            Err(e) => {
                log::error!("cannot read '{}': {e}", path.display());
                VerificationOutcome::IoError
            }
        };
        Finding {
            name: artifact.name.clone(),
            path: Some(path.to_path_buf()),
            outcome,
        }
    }
}

fn outcomes(findings: &[Finding]) -> Vec<VerificationOutcome> {
    findings.iter().map(|f| f.outcome).collect()
}
