//! End-to-end tests for the gatecheck binary.
//!
//! Each test deploys the guard the way it ships: the binary copied into a
//! directory with its manifest sidecar and entry script beside it, then
//! spawned as a real process. This is the layer that proves the whole
//! pipeline: policy resolution, digest checks, resolver lookups, and the
//! proceed/abort exit contract.

#![cfg(unix)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

use gatecheck::digest::compute_digest;

/// Exit status the guard uses for configuration errors.
const EXIT_CONFIG: i32 = 2;
/// Exit status the guard uses for an abort decision.
const EXIT_TAMPER: i32 = 3;

/// A deployed guard: binary, sidecar manifest, and entry script in one
/// directory, plus a search root for dependency modules.
struct Deployment {
    dir: TempDir,
    root: TempDir,
    exe: PathBuf,
}

impl Deployment {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let exe = dir.path().join("app");
        fs::copy(env!("CARGO_BIN_EXE_gatecheck"), &exe).unwrap();
        Deployment {
            dir,
            root: TempDir::new().unwrap(),
            exe,
        }
    }

    fn write_script(&self, content: &str) -> String {
        let path = self.dir.path().join("main.sh");
        fs::write(&path, content).unwrap();
        compute_digest(&path).unwrap()
    }

    fn write_module(&self, filename: &str, content: &str) -> String {
        let path = self.root.path().join(filename);
        fs::write(&path, content).unwrap();
        compute_digest(&path).unwrap()
    }

    fn write_manifest(&self, script_digest: &str, modules: &[(&str, &str)]) {
        let modules_json: Vec<String> = modules
            .iter()
            .map(|(name, digest)| format!(r#"{{"name": "{name}", "sha1": "{digest}"}}"#))
            .collect();
        let json = format!(
            r#"{{
                "script": {{"name": "main", "sha1": "{script_digest}"}},
                "modules": [{}],
                "source_suffix": ".sh",
                "package_init": "init.sh",
                "interpreter": "sh"
            }}"#,
            modules_json.join(", ")
        );
        let mut sidecar = self.exe.as_os_str().to_os_string();
        sidecar.push(".manifest.json");
        fs::write(Path::new(&sidecar), json).unwrap();
    }

    fn run(&self, args: &[&str], envs: &[(&str, &str)]) -> Output {
        let mut cmd = Command::new(&self.exe);
        cmd.args(args)
            .env_remove("GATECHECK_MANIFEST")
            .env_remove("GATECHECK_INTERPRETER")
            .env_remove("GATECHECK_SECURITY")
            .env_remove("GATECHECK_LOGLEVEL")
            .env_remove("VIRTUAL_ENV")
            .env("GATECHECK_PATH", self.root.path());
        for (k, v) in envs {
            cmd.env(k, v);
        }
        cmd.output().expect("failed to spawn guard")
    }
}

fn stderr_text(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).to_string()
}

#[test]
fn clean_deployment_runs_the_script() {
    let d = Deployment::new();
    let digest = d.write_script("exit 42\n");
    d.write_manifest(&digest, &[]);

    let out = d.run(&[], &[]);
    assert_eq!(out.status.code(), Some(42), "stderr: {}", stderr_text(&out));
}

#[test]
fn forwarded_args_reach_the_script_with_security_flags_stripped() {
    let d = Deployment::new();
    let digest = d.write_script("printf '%s\\n' \"$@\" > \"$(dirname \"$0\")/args.txt\"\n");
    d.write_manifest(&digest, &[]);

    let out = d.run(&["--SECURITYWARN", "foo", "--bar", "-x"], &[]);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr_text(&out));
    let recorded = fs::read_to_string(d.dir.path().join("args.txt")).unwrap();
    assert_eq!(recorded, "foo\n--bar\n-x\n");
}

#[test]
fn tampered_script_aborts_with_a_report_naming_it() {
    let d = Deployment::new();
    let digest = d.write_script("exit 0\n");
    d.write_manifest(&digest, &[]);
    // Tamper after sealing.
    d.write_script("echo pwned; exit 0\n");

    let out = d.run(&[], &[]);
    assert_eq!(out.status.code(), Some(EXIT_TAMPER));
    let err = stderr_text(&out);
    assert!(err.contains("tampered"), "stderr: {err}");
    assert!(err.contains("main.sh"), "stderr: {err}");
    assert!(!String::from_utf8_lossy(&out.stdout).contains("pwned"));
}

#[test]
fn tampered_dependency_aborts_at_normal() {
    let d = Deployment::new();
    let script_digest = d.write_script("exit 0\n");
    let dep_digest = d.write_module("util.sh", "sealed\n");
    d.write_manifest(&script_digest, &[("util", &dep_digest)]);
    d.write_module("util.sh", "tampered\n");

    let out = d.run(&[], &[]);
    assert_eq!(out.status.code(), Some(EXIT_TAMPER));
    assert!(stderr_text(&out).contains("util.sh"));
}

#[test]
fn missing_dependency_is_tolerated_at_normal() {
    let d = Deployment::new();
    let digest = d.write_script("exit 5\n");
    d.write_manifest(&digest, &[("pkg.sub", "0123456789abcdef0123456789abcdef01234567")]);

    let out = d.run(&[], &[]);
    assert_eq!(out.status.code(), Some(5), "stderr: {}", stderr_text(&out));
}

#[test]
fn security_off_skips_verification_entirely() {
    let d = Deployment::new();
    let digest = d.write_script("exit 0\n");
    d.write_manifest(&digest, &[]);
    d.write_script("exit 9\n"); // tampered, but policy is off

    let out = d.run(&["--SECURITYOFF"], &[]);
    assert_eq!(out.status.code(), Some(9), "stderr: {}", stderr_text(&out));
}

#[test]
fn warn_reports_tampering_but_proceeds() {
    let d = Deployment::new();
    let digest = d.write_script("exit 0\n");
    d.write_manifest(&digest, &[]);
    d.write_script("exit 11\n");

    let out = d.run(&["--SECURITYWARN"], &[]);
    assert_eq!(out.status.code(), Some(11));
    assert!(stderr_text(&out).contains("tampered"));
}

#[test]
fn invalid_security_flag_is_a_usage_error() {
    let d = Deployment::new();
    let digest = d.write_script("touch \"$(dirname \"$0\")/ran\"\n");
    d.write_manifest(&digest, &[]);

    let out = d.run(&["--SECURITYFOO"], &[]);
    assert_eq!(out.status.code(), Some(EXIT_CONFIG));
    assert!(stderr_text(&out).contains("--SECURITYFOO"));
    assert!(
        !d.dir.path().join("ran").exists(),
        "application must not run after a usage error"
    );
}

#[test]
fn environment_selects_the_policy_level() {
    let d = Deployment::new();
    let digest = d.write_script("exit 0\n");
    d.write_manifest(&digest, &[]);
    d.write_script("exit 13\n");

    // WARN from the environment: tampering reported, still proceeds.
    let out = d.run(&[], &[("GATECHECK_SECURITY", "WARN")]);
    assert_eq!(out.status.code(), Some(13), "stderr: {}", stderr_text(&out));
}

#[test]
fn cli_flag_overrides_environment_level() {
    let d = Deployment::new();
    let digest = d.write_script("exit 0\n");
    d.write_manifest(&digest, &[]);
    d.write_script("exit 13\n");

    let out = d.run(&["--SECURITYNORMAL"], &[("GATECHECK_SECURITY", "OFF")]);
    assert_eq!(out.status.code(), Some(EXIT_TAMPER));
}

#[test]
fn unrecognized_environment_level_warns_and_keeps_the_default() {
    let d = Deployment::new();
    let digest = d.write_script("exit 0\n");
    d.write_manifest(&digest, &[]);
    d.write_script("exit 13\n");

    // Default stays NORMAL, so the tampered script still aborts.
    let out = d.run(&[], &[("GATECHECK_SECURITY", "PARANOID")]);
    assert_eq!(out.status.code(), Some(EXIT_TAMPER));
    assert!(stderr_text(&out).contains("PARANOID"));
}

#[test]
fn missing_manifest_is_a_config_error() {
    let d = Deployment::new();
    d.write_script("exit 0\n");
    // No manifest sidecar written.

    let out = d.run(&[], &[]);
    assert_eq!(out.status.code(), Some(EXIT_CONFIG));
    assert!(stderr_text(&out).contains("manifest"));
}

#[test]
fn debug_loglevel_reveals_expected_and_detected_digests() {
    let d = Deployment::new();
    let digest = d.write_script("exit 0\n");
    d.write_manifest(&digest, &[]);
    d.write_script("exit 1\n");

    let out = d.run(&[], &[("GATECHECK_LOGLEVEL", "10")]);
    assert_eq!(out.status.code(), Some(EXIT_TAMPER));
    let err = stderr_text(&out);
    assert!(err.contains("expected"), "stderr: {err}");
    assert!(err.contains(&digest), "stderr: {err}");
}

#[test]
fn nested_dependency_resolves_through_package_directories() {
    let d = Deployment::new();
    let script_digest = d.write_script("exit 0\n");
    let pkg = d.root.path().join("pkg");
    fs::create_dir(&pkg).unwrap();
    fs::write(pkg.join("sub.sh"), "sealed\n").unwrap();
    let dep_digest = compute_digest(&pkg.join("sub.sh")).unwrap();
    d.write_manifest(&script_digest, &[("pkg.sub", &dep_digest)]);

    let out = d.run(&[], &[]);
    assert_eq!(out.status.code(), Some(0), "stderr: {}", stderr_text(&out));

    // Now tamper the nested module: the resolver must find it and abort.
    fs::write(pkg.join("sub.sh"), "tampered\n").unwrap();
    let out = d.run(&[], &[]);
    assert_eq!(out.status.code(), Some(EXIT_TAMPER));
}
