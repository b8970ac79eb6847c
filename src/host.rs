//! Execution environment contract.
//!
//! The guard never loads or runs anything itself; it gates whether the
//! environment's load-and-run entry point may be called. This module holds
//! that contract and the default implementation backed by an external
//! interpreter process.

use anyhow::{Context, Result};
use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
    process::Command,
};

/// Environment variable supplying the ordered search roots, as a
/// platform path-list (the hosted runtime's module search path).
pub const SEARCH_PATH_ENV: &str = "GATECHECK_PATH";

/// Environment variable overriding the manifest's interpreter command.
pub const INTERPRETER_ENV: &str = "GATECHECK_INTERPRETER";

/// Variable marking the child process as guard-launched.
const GUARD_MARKER_ENV: &str = "GATECHECK";

/// Virtual-runtime activation variable; its library directory extends the
/// search roots when present.
const VIRTUAL_ENV: &str = "VIRTUAL_ENV";

/// The capabilities the guard consumes from its host environment.
pub trait ExecutionEnv {
    /// Ordered module search roots, first match wins.
    fn search_roots(&self) -> Vec<PathBuf>;

    /// Loads and runs the verified script, returning the application's
    /// exit code. Must only be called after a `Proceed` decision.
    fn load_and_run(&self, script: &Path, args: &[OsString]) -> Result<i32>;
}

/// Default environment: an external interpreter process.
#[derive(Debug)]
pub struct InterpreterEnv {
    interpreter: OsString,
}

impl InterpreterEnv {
    /// Builds the environment around `manifest_interpreter`, letting
    /// `GATECHECK_INTERPRETER` override it.
    pub fn new(manifest_interpreter: Option<&str>) -> Self {
        let interpreter = env::var_os(INTERPRETER_ENV)
            .unwrap_or_else(|| OsString::from(manifest_interpreter.unwrap_or("python3")));
        InterpreterEnv { interpreter }
    }
}

impl ExecutionEnv for InterpreterEnv {
    fn search_roots(&self) -> Vec<PathBuf> {
        let mut roots: Vec<PathBuf> = env::var_os(SEARCH_PATH_ENV)
            .map(|raw| env::split_paths(&raw).collect())
            .unwrap_or_default();

        if let Some(extra) = virtual_runtime_root() {
            roots.push(extra);
        }
        roots
    }

    fn load_and_run(&self, script: &Path, args: &[OsString]) -> Result<i32> {
        log::info!("running {}", script.display());
        let status = Command::new(&self.interpreter)
            .arg(script)
            .args(args)
            .env(GUARD_MARKER_ENV, "1")
            .status()
            .with_context(|| {
                format!(
                    "could not launch interpreter {}",
                    Path::new(&self.interpreter).display()
                )
            })?;
        // A signal-terminated child carries no code; report failure.
        Ok(status.code().unwrap_or(1))
    }
}

/// Library directory of an active virtual runtime, if any.
///
/// Looks for `lib` first, then `Lib`. An activation variable pointing at
/// a directory with neither is reported but not fatal.
fn virtual_runtime_root() -> Option<PathBuf> {
    let venv = env::var_os(VIRTUAL_ENV)?;
    let base = PathBuf::from(venv);
    for lib in ["lib", "Lib"] {
        let candidate = base.join(lib);
        if candidate.is_dir() {
            log::debug!("extending search roots with {}", candidate.display());
            return Some(candidate);
        }
    }
    log::warn!(
        "{VIRTUAL_ENV} defined, but missing target {}",
        base.display()
    );
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn interpreter_defaults_to_python3_without_overrides() {
        // Relies on GATECHECK_INTERPRETER being unset in the test
        // environment.
        if env::var_os(INTERPRETER_ENV).is_some() {
            return;
        }
        let env_ = InterpreterEnv::new(None);
        assert_eq!(env_.interpreter, OsString::from("python3"));
    }

    #[test]
    fn manifest_interpreter_is_honored() {
        if env::var_os(INTERPRETER_ENV).is_some() {
            return;
        }
        let env_ = InterpreterEnv::new(Some("lua"));
        assert_eq!(env_.interpreter, OsString::from("lua"));
    }

    #[cfg(unix)]
    #[test]
    fn load_and_run_returns_child_exit_code() {
        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("exit7.sh");
        std::fs::write(&script, "exit 7\n").unwrap();

        let env_ = InterpreterEnv {
            interpreter: OsString::from("sh"),
        };
        let code = env_.load_and_run(&script, &[]).unwrap();
        assert_eq!(code, 7);
    }

    #[cfg(unix)]
    #[test]
    fn load_and_run_marks_the_child() {
        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("marker.sh");
        std::fs::write(&script, "test \"$GATECHECK\" = 1\n").unwrap();

        let env_ = InterpreterEnv {
            interpreter: OsString::from("sh"),
        };
        assert_eq!(env_.load_and_run(&script, &[]).unwrap(), 0);
    }

    #[test]
    fn missing_interpreter_is_an_error() {
        let env_ = InterpreterEnv {
            interpreter: OsString::from("gatecheck-no-such-interpreter"),
        };
        assert!(env_
            .load_and_run(Path::new("script"), &[])
            .is_err());
    }
}
