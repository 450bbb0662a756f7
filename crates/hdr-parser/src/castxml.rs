//! The castxml subprocess and its diagnostics.
//!
//! [`ExternalParser`] is the seam the driver talks to; [`CastXml`] is the
//! real implementation. `Command::output` drains stdout and stderr together,
//! so a chatty castxml cannot block on a full pipe.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use hdr_config::{CastXmlConfig, ConfigError};
use regex::Regex;

use crate::error::ParserError;
use crate::logger::{Location, Logger};

/// Environment variable naming the castxml binary when the config does not.
pub const CASTXML_ENV: &str = "CASTXML";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// A C++ front end that can preprocess a header and dump its declarations as XML.
pub trait ExternalParser {
    /// Preprocess `header`, keeping `#define`s, and return the text on stdout.
    ///
    /// # Errors
    /// Returns `ParserError` when the process cannot be started.
    fn preprocess(&self, header: &Path, include_dirs: &[PathBuf]) -> Result<ProcessOutput, ParserError>;

    /// Compile `header` and write the gccxml-format dump to `xml_out`.
    ///
    /// # Errors
    /// Returns `ParserError` when the process cannot be started.
    fn emit_xml(
        &self,
        header: &Path,
        include_dirs: &[PathBuf],
        xml_out: &Path,
    ) -> Result<ProcessOutput, ParserError>;
}

#[derive(Debug, Clone)]
pub struct CastXml {
    executable: PathBuf,
    args: Vec<String>,
}

impl CastXml {
    /// Find castxml: the configured path, then `$CASTXML`, then `PATH`.
    ///
    /// # Errors
    /// Returns `ParserError::ExecutableNotFound` when none of them yields a file.
    pub fn locate(config: &CastXmlConfig) -> Result<Self, ParserError> {
        let executable = match &config.executable {
            Some(path) if path.is_file() => path.clone(),
            Some(path) => return Err(ParserError::ExecutableNotFound(path.display().to_string())),
            None => match env::var_os(CASTXML_ENV).map(PathBuf::from) {
                Some(path) if path.is_file() => path,
                _ => which::which("castxml")
                    .map_err(|e| ParserError::ExecutableNotFound(format!("castxml ({e})")))?,
            },
        };

        let mut args = config.base_args.clone();
        args.extend(config.extra_args.iter().cloned());
        Ok(Self { executable, args })
    }

    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn command(&self, include_dirs: &[PathBuf]) -> Command {
        let mut command = Command::new(&self.executable);
        command.args(&self.args);
        for dir in include_dirs {
            command.arg("-I").arg(dir);
        }
        command
    }

    fn execute(mut command: Command, stage: &str) -> Result<ProcessOutput, ParserError> {
        tracing::debug!(?command, stage, "running castxml");
        let output = command.output().map_err(|e| ParserError::ProcessFailed {
            stage: stage.to_string(),
            message: e.to_string(),
        })?;
        Ok(ProcessOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

impl ExternalParser for CastXml {
    fn preprocess(&self, header: &Path, include_dirs: &[PathBuf]) -> Result<ProcessOutput, ParserError> {
        let mut command = self.command(include_dirs);
        command.args(["-E", "-dD"]).arg(header);
        Self::execute(command, "preprocessing")
    }

    fn emit_xml(
        &self,
        header: &Path,
        include_dirs: &[PathBuf],
        xml_out: &Path,
    ) -> Result<ProcessOutput, ParserError> {
        let mut command = self.command(include_dirs);
        command.arg("-o").arg(xml_out).arg(header);
        Self::execute(command, "emitting xml")
    }
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

static LOCATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?):(\d+):(\d+):\s*(.*)$").expect("valid regex"));

/// Routes castxml stderr lines into a [`Logger`].
///
/// Lines matching a configured filter are warnings; otherwise a line
/// containing `error:` is an error and anything else a warning.
#[derive(Debug, Default)]
pub struct DiagnosticRouter {
    filters: Vec<Regex>,
}

impl DiagnosticRouter {
    /// # Errors
    /// Returns `ParserError::Config` when a filter is not a valid regex.
    pub fn new(filters: &[String]) -> Result<Self, ParserError> {
        let filters = filters
            .iter()
            .map(|f| {
                Regex::new(f).map_err(|e| ConfigError::InvalidValue {
                    field: "castxml.diagnostic_filters".into(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { filters })
    }

    pub fn route(&self, stderr: &str, log: &mut Logger) {
        for line in stderr.lines().map(str::trim_end).filter(|l| !l.is_empty()) {
            let (location, message) = match LOCATION_RE.captures(line) {
                Some(caps) => (
                    Some(Location::new(
                        &caps[1],
                        caps[2].parse().unwrap_or(0),
                        caps[3].parse().unwrap_or(0),
                    )),
                    caps.get(4).map_or(line, |m| m.as_str()),
                ),
                None => (None, line),
            };

            let pushed = location.is_some();
            if let Some(location) = location {
                log.push_location(location);
            }
            if self.filters.iter().any(|f| f.is_match(line)) {
                log.warning(message);
            } else if line.contains("error:") {
                log.error(message);
            } else {
                log.warning(message);
            }
            if pushed {
                log.pop_location();
            }
        }
    }
}
