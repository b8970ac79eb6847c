//! The guard binary.
//!
//! Wraps a script-hosted application: verifies the entry script and the
//! manifest's dependency modules (and, at maximum strictness, the host
//! executable's code signature) before any of the application's code
//! runs. On `Proceed` the remaining command line is handed to the
//! execution environment; on `Abort` the load/run entry point is never
//! invoked and the process exits with a distinguished status.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::ExitCode;

use gatecheck::cli;
use gatecheck::diag;
use gatecheck::host::{ExecutionEnv, InterpreterEnv};
use gatecheck::manifest::Manifest;
use gatecheck::policy::{self, Decision, PolicyLevel};
use gatecheck::trust::{self, PlatformTrust};
use gatecheck::verify::Verifier;

/// Exit status for configuration errors (bad flag, unloadable manifest).
const EXIT_CONFIG: u8 = 2;

/// Distinguished exit status for an `Abort` decision.
const EXIT_TAMPER: u8 = 3;

/// Environment variable naming the policy level.
const SECURITY_ENV: &str = "GATECHECK_SECURITY";

/// Environment variable overriding the manifest sidecar location.
const MANIFEST_ENV: &str = "GATECHECK_MANIFEST";

/// The manifest sidecar: `<executable>.manifest.json`, sealed next to the
/// guard at packaging time.
fn manifest_path(executable: &std::path::Path) -> PathBuf {
    match std::env::var_os(MANIFEST_ENV) {
        Some(p) => PathBuf::from(p),
        None => {
            let mut name = executable.as_os_str().to_os_string();
            name.push(".manifest.json");
            PathBuf::from(name)
        }
    }
}

fn run() -> Result<u8> {
    let executable = trust::current_executable_path()?;

    let parsed = match cli::parse_args(std::env::args_os().skip(1)) {
        Ok(p) => p,
        Err(e) => {
            log::error!("{e}");
            return Ok(EXIT_CONFIG);
        }
    };

    let manifest_file = manifest_path(&executable);
    let manifest = match Manifest::load(&manifest_file) {
        Ok(m) => m,
        Err(e) => {
            // An unverifiable configuration never proceeds.
            log::error!("{e}");
            return Ok(EXIT_CONFIG);
        }
    };

    let default_level = manifest
        .default_level
        .as_deref()
        .and_then(PolicyLevel::from_name)
        .unwrap_or(PolicyLevel::Normal);
    let env_level = std::env::var(SECURITY_ENV).ok();
    let level = policy::resolve_level(default_level, env_level.as_deref(), parsed.level_override);
    log::debug!("effective security level: {level}");

    let env = InterpreterEnv::new(manifest.interpreter.as_deref());
    let roots = env.search_roots();

    let authority = PlatformTrust;
    let verifier = Verifier::new(&manifest, &roots, &authority);
    let report = verifier.run(level, &executable);

    match report.decision {
        Decision::Abort => Ok(EXIT_TAMPER),
        Decision::Proceed => {
            let script = executable
                .parent()
                .unwrap_or_else(|| std::path::Path::new("."))
                .join(
                    manifest
                        .script
                        .expected_filename(&manifest.layout.source_suffix),
                );
            let code = env
                .load_and_run(&script, &parsed.forwarded)
                .context("handing off to the execution environment")?;
            // Child exit codes are masked into u8 range by the OS anyway.
            Ok((code & 0xff) as u8)
        }
    }
}

fn main() -> ExitCode {
    diag::init();
    diag::apply_env_threshold(std::env::var(diag::LOGLEVEL_ENV).ok().as_deref());

    match run() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::from(EXIT_CONFIG)
        }
    }
}
