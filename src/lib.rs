//! # gatecheck -- pre-execution integrity guard
//!
//! Verifies a script-hosted application before control ever reaches the
//! interpreter that runs it: the entry script and a manifest of trusted
//! dependency modules are digest-checked against a build-time manifest,
//! and (at the strictest policy level) the hosting executable must carry
//! a platform-trusted code signature.
//!
//! ## Security Properties
//!
//! - **`#![forbid(unsafe_code)]`**: no `unsafe` blocks anywhere.
//! - **Fail closed**: a partial or ambiguous failure (unreadable entry
//!   script, unknown trust-verification error) never grants trust. The
//!   only tolerated absence is an uninstalled *optional* dependency.
//! - **Nothing swallowed**: every finding is reported to the diagnostic
//!   channel before a decision is rendered; silent success under error
//!   would defeat the control's purpose.
//! - **Defensive input handling**: all file reads are symlink-checked and
//!   size-bounded; digests are streamed in fixed-size chunks.
//! - **Delegated crypto**: gatecheck does not implement a hash function.
//!   Digesting is the `sha1` crate (RustCrypto, pure Rust, no FFI);
//!   code-signature verification is the platform's, consumed through the
//!   [`trust::TrustAuthority`] seam.
//!
//! ## Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`digest`] | Streaming digest computation and digest equality |
//! | [`manifest`] | Build-time manifest model: expected digests, one entry script |
//! | [`resolve`] | Ordered-search, package-shadowing artifact resolution |
//! | [`trust`] | Host code-signing trust states and the platform adapter |
//! | [`policy`] | Policy levels and the pure proceed/abort decision function |
//! | [`verify`] | The one-pass verification orchestrator |
//! | [`cli`] | Reserved-flag isolation from the forwarded command line |
//! | [`host`] | Execution environment contract (search roots, load-and-run) |
//! | [`diag`] | Leveled stderr diagnostics |
//! | [`errors`] | Configuration and manifest error types |

#![forbid(unsafe_code)]

/// Reserved-flag isolation: policy overrides are parsed and stripped, all
/// other arguments are forwarded to the hosted application verbatim.
pub mod cli;

/// Leveled stderr diagnostics with an environment-selected threshold.
pub mod diag;

/// Streaming digest computation (symlink-checked, size-bounded) and
/// case-insensitive digest equality.
pub mod digest;

/// Configuration and manifest error types.
pub mod errors;

/// Execution environment contract: search roots and the load-and-run
/// entry point that is gated behind a `Proceed` decision.
pub mod host;

/// Manifest model: the build-time table of expected artifact digests plus
/// exactly one entry script.
pub mod manifest;

/// Policy levels, per-artifact verification outcomes, and the pure
/// decision function.
pub mod policy;

/// Hierarchical artifact-name resolution against ordered search roots.
pub mod resolve;

/// Host code-signing trust: status taxonomy and the platform adapter.
pub mod trust;

/// The verification orchestrator: one strictly sequential pass per run.
pub mod verify;
