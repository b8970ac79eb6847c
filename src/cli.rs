//! Reserved-flag isolation.
//!
//! The guard owns exactly one slice of the command line: arguments carrying
//! the reserved `--SECURITY` token. Those select a policy level and are
//! stripped; everything else belongs to the hosted application and is
//! forwarded untouched, in order, even when it looks like a flag. An
//! argument that carries the reserved token but matches no recognized form
//! is a usage error, never forwarded: a typo in a security flag must not
//! quietly run the application at the default policy.

use std::ffi::OsString;

use crate::errors::ConfigError;
use crate::policy::PolicyLevel;

/// The reserved prefix the guard claims for itself.
pub const RESERVED_TOKEN: &str = "--SECURITY";

/// Result of isolating the guard's flags from the application's arguments.
#[derive(Debug, PartialEq, Eq)]
pub struct ParsedArgs {
    /// Policy override from the command line, if any. When a level is
    /// given more than once, the last occurrence wins.
    pub level_override: Option<PolicyLevel>,
    /// Everything forwarded to the hosted application, order preserved.
    pub forwarded: Vec<OsString>,
}

/// Scans `args` (excluding argv[0]) for reserved security flags.
pub fn parse_args<I>(args: I) -> Result<ParsedArgs, ConfigError>
where
    I: IntoIterator<Item = OsString>,
{
    let mut level_override = None;
    let mut forwarded = Vec::new();

    for arg in args {
        // Non-UTF-8 arguments cannot carry the (ASCII) reserved token;
        // they are the application's business.
        let text = match arg.to_str() {
            Some(t) => t,
            None => {
                forwarded.push(arg);
                continue;
            }
        };
        match text {
            "--SECURITYOFF" => level_override = Some(PolicyLevel::Disabled),
            "--SECURITYWARN" => level_override = Some(PolicyLevel::Warn),
            "--SECURITYNORMAL" => level_override = Some(PolicyLevel::Normal),
            "--SECURITYMAX" => level_override = Some(PolicyLevel::Max),
            _ if text.starts_with(RESERVED_TOKEN) => {
                return Err(ConfigError {
                    argument: text.to_string(),
                });
            }
            _ => forwarded.push(arg),
        }
    }

    Ok(ParsedArgs {
        level_override,
        forwarded,
    })
}
