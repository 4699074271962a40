// SPDX-License-Identifier: MIT OR Apache-2.0
//! Major/minor level debug logging.
//!
//! A [`LevelLogger`] resolves its active levels once, from an environment
//! variable or from a JSON definition file, and then decides per call whether
//! a `(major, minor)` pair is on. Enabled messages are printed to stdout
//! and/or appended to a log file.
//!
//! The logger is an ordinary value: construct it at startup and pass it by
//! reference to whatever needs diagnostics.
#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod definition;
pub mod levels;

pub use definition::{DateFormat, DebugDefinitions, DebugSpecEntry};
pub use levels::{CompareMode, LevelRules, MinorLevel, MinorRule, normalize_levels};

use chrono::{Local, NaiveDateTime};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Fatal configuration failures raised while initializing a logger.
#[derive(Debug, thiserror::Error)]
pub enum DebugError {
    /// The definition file could not be opened.
    #[error("failed to open debug definition file {path}")]
    DefinitionFile {
        /// Path that was requested.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The definition file is not valid JSON of the expected shape.
    #[error("failed to parse debug definition file {path}")]
    DefinitionParse {
        /// Path that was requested.
        path: String,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// The log destination could not be opened for writing.
    #[error("failed to open debug logging file {path}")]
    LogFile {
        /// Path that was requested.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Options and settings
// ---------------------------------------------------------------------------

/// Caller-supplied defaults and source locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerOptions {
    /// Program name, used to select a definition entry and in every line.
    pub program_name: String,
    /// Environment variable holding a raw level spec.
    pub env_var: Option<String>,
    /// JSON definition file consulted when the variable is unset.
    pub definitions: Option<PathBuf>,
    /// Default log destination.
    pub log_file: Option<PathBuf>,
    /// Default for appending to the log destination.
    pub logging: bool,
    /// Default for printing to stdout.
    pub printing: bool,
    /// Default threshold comparison.
    pub compare: CompareMode,
}

impl LoggerOptions {
    /// Defaults for `program_name`: printing on, logging off, `le`.
    #[must_use]
    pub fn new(program_name: impl Into<String>) -> Self {
        Self {
            program_name: program_name.into(),
            env_var: None,
            definitions: None,
            log_file: None,
            logging: false,
            printing: true,
            compare: CompareMode::Le,
        }
    }

    /// Read the level spec from `var` when it is set.
    #[must_use]
    pub fn env_var(mut self, var: impl Into<String>) -> Self {
        self.env_var = Some(var.into());
        self
    }

    /// Fall back to the definition file at `path`.
    #[must_use]
    pub fn definitions(mut self, path: impl Into<PathBuf>) -> Self {
        self.definitions = Some(path.into());
        self
    }

    /// Append enabled lines to `path`.
    #[must_use]
    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self.logging = true;
        self
    }

    /// Toggle stdout printing.
    #[must_use]
    pub fn printing(mut self, on: bool) -> Self {
        self.printing = on;
        self
    }

    /// Threshold comparison mode.
    #[must_use]
    pub fn compare(mut self, mode: CompareMode) -> Self {
        self.compare = mode;
        self
    }
}

/// Where the active level spec came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelSource {
    /// The named environment variable.
    Environment(String),
    /// The matching entry of a definition file.
    DefinitionFile(PathBuf),
    /// Nothing matched; the logger is inactive.
    Unresolved,
}

/// Resolved settings of a logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerSettings {
    /// Program name.
    pub program_name: String,
    /// Normalized level spec (empty when unresolved).
    pub levels: String,
    /// Threshold comparison mode.
    pub compare: CompareMode,
    /// Print enabled lines to stdout.
    pub printing: bool,
    /// Append enabled lines to `log_file`; false unless the file was opened.
    pub logging: bool,
    /// Log destination.
    pub log_file: Option<PathBuf>,
    /// Spaces of indentation per minor level.
    pub indent_space: usize,
    /// Timestamp layout.
    pub date_format: DateFormat,
    /// Source of `levels`.
    pub source: LevelSource,
}

// ---------------------------------------------------------------------------
// LevelLogger
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum LoggerState {
    Active(LevelRules),
    Inactive,
}

/// Widest pad [`LevelLogger::format_line`] puts between the level tag and
/// the message.
pub const MAX_INDENT_WIDTH: usize = 256;

/// Conditional logger keyed by `(major, minor)` levels.
///
/// # Examples
///
/// ```
/// use srg_debug::{LevelLogger, LoggerOptions};
///
/// let opts = LoggerOptions::new("demo").env_var("DEMO_DEBUG");
/// let logger = LevelLogger::initialize_with_env(opts, Some("0.3".into())).unwrap();
/// assert!(logger.is_level_enabled(0, 2));
/// assert!(!logger.is_level_enabled(0, 4));
/// assert!(!logger.is_level_enabled(1, 0));
/// ```
#[derive(Debug)]
pub struct LevelLogger {
    settings: LoggerSettings,
    state: LoggerState,
    sink: Option<File>,
    pid: u32,
}

impl LevelLogger {
    /// Resolve levels from the process environment and the definition file.
    ///
    /// The environment variable wins; the definition file is only read when
    /// the variable is unset. Failing to open or parse the definition file,
    /// or to open the log destination, is fatal.
    pub fn initialize(options: LoggerOptions) -> Result<Self, DebugError> {
        let env_value = options
            .env_var
            .as_deref()
            .and_then(|var| std::env::var(var).ok());
        Self::initialize_with_env(options, env_value)
    }

    /// Like [`LevelLogger::initialize`], with the variable's value supplied
    /// by the caller instead of read from the process environment.
    pub fn initialize_with_env(
        options: LoggerOptions,
        env_value: Option<String>,
    ) -> Result<Self, DebugError> {
        let LoggerOptions {
            program_name,
            env_var,
            definitions,
            log_file,
            logging,
            printing,
            compare,
        } = options;

        let mut settings = LoggerSettings {
            program_name,
            levels: String::new(),
            compare,
            printing,
            logging,
            log_file,
            indent_space: 0,
            date_format: DateFormat::Mdy,
            source: LevelSource::Unresolved,
        };

        let raw = match (env_var, env_value, definitions) {
            (Some(var), Some(value), _) => {
                settings.source = LevelSource::Environment(var);
                Some(value)
            }
            (_, _, Some(path)) => {
                let defs = DebugDefinitions::load(&path)?;
                let raw = defs
                    .entry_for(&settings.program_name)
                    .map(|entry| apply_entry(&mut settings, entry));
                if raw.is_some() {
                    settings.source = LevelSource::DefinitionFile(path);
                }
                raw
            }
            _ => None,
        };

        let state = match raw {
            Some(raw) => {
                settings.levels = normalize_levels(&raw);
                LoggerState::Active(LevelRules::parse(&settings.levels))
            }
            None => LoggerState::Inactive,
        };

        let sink = match (&settings.log_file, settings.logging) {
            (Some(path), true) => Some(open_log_file(path)?),
            _ => None,
        };
        settings.logging = sink.is_some();

        debug!(
            target: "srg.debug",
            program = %settings.program_name,
            levels = %settings.levels,
            source = ?settings.source,
            "level logger initialized"
        );

        Ok(Self {
            settings,
            state,
            sink,
            pid: std::process::id(),
        })
    }

    /// A logger that never enables anything.
    #[must_use]
    pub fn disabled(program_name: impl Into<String>) -> Self {
        Self {
            settings: LoggerSettings {
                program_name: program_name.into(),
                levels: String::new(),
                compare: CompareMode::Le,
                printing: false,
                logging: false,
                log_file: None,
                indent_space: 0,
                date_format: DateFormat::Mdy,
                source: LevelSource::Unresolved,
            },
            state: LoggerState::Inactive,
            sink: None,
            pid: std::process::id(),
        }
    }

    /// Resolved settings.
    #[must_use]
    pub fn settings(&self) -> &LoggerSettings {
        &self.settings
    }

    /// Whether a level source matched.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.state, LoggerState::Active(_))
    }

    /// Whether `(major, minor)` is enabled. Always false when inactive.
    pub fn is_level_enabled(&self, major: u32, minor: impl Into<MinorLevel>) -> bool {
        match &self.state {
            LoggerState::Active(rules) => rules.is_enabled(self.settings.compare, major, &minor.into()),
            LoggerState::Inactive => false,
        }
    }

    /// Emit `message` at `(major, minor)` if that level is enabled.
    pub fn log(&mut self, major: u32, minor: impl Into<MinorLevel>, message: &str) {
        let minor = minor.into();
        if !self.is_level_enabled(major, minor.clone()) {
            return;
        }
        let line = self.format_line(major, &minor, message, Local::now().naive_local());

        if self.settings.printing {
            println!("{line}");
        }
        if let Some(file) = self.sink.as_mut() {
            if let Err(e) = append_line(file, &line) {
                warn!(target: "srg.debug", error = %e, "failed to append to debug log");
            }
        }
    }

    /// Render one output line without emitting it.
    ///
    /// Layout: `<timestamp>: <program>[<pid>] (<major>,<minor>)<pad><message>`
    /// where the pad is `minor * indent_space` spaces, at most
    /// [`MAX_INDENT_WIDTH`].
    #[must_use]
    pub fn format_line(
        &self,
        major: u32,
        minor: &MinorLevel,
        message: &str,
        at: NaiveDateTime,
    ) -> String {
        let pad = (minor.as_number().unwrap_or(0) as usize)
            .saturating_mul(self.settings.indent_space)
            .min(MAX_INDENT_WIDTH);
        format!(
            "{}: {}[{}] ({},{}){:pad$}{}",
            at.format(self.settings.date_format.pattern()),
            self.settings.program_name,
            self.pid,
            major,
            minor,
            "",
            message,
        )
    }
}

impl fmt::Display for LevelLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.settings;
        writeln!(f, "prog_name: {}", s.program_name)?;
        writeln!(
            f,
            "log_fn: {}",
            s.log_file.as_deref().map(Path::display).map(|d| d.to_string()).unwrap_or_default()
        )?;
        writeln!(f, "levels: {}", s.levels)?;
        writeln!(f, "logging: {}", s.logging)?;
        writeln!(f, "printing: {}", s.printing)?;
        writeln!(f, "source: {:?}", s.source)?;
        writeln!(f, "eval: {}", s.compare)?;
        writeln!(f, "indent_space: {}", s.indent_space)?;
        write!(f, "date_fmt: {}", s.date_format)
    }
}

/// Copy the fields of a matched definition entry over the defaults and
/// return its raw level spec.
fn apply_entry(settings: &mut LoggerSettings, entry: &DebugSpecEntry) -> String {
    if let Some(p) = entry.printing {
        settings.printing = p != 0;
    }
    if let Some(l) = entry.logging {
        settings.logging = l != 0;
    }
    if let Some(path) = &entry.log_file {
        settings.log_file = (!path.is_empty()).then(|| PathBuf::from(path));
    }
    if let Some(eval) = entry.eval {
        settings.compare = eval;
    }
    if let Some(indent) = entry.indent_space {
        settings.indent_space = usize::try_from(indent).unwrap_or(0);
    }
    if let Some(fmt) = entry.date_fmt {
        settings.date_format = fmt;
    }
    entry.levels.clone()
}

fn open_log_file(path: &Path) -> Result<File, DebugError> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|source| DebugError::LogFile {
            path: path.display().to_string(),
            source,
        })
}

fn append_line(file: &mut File, line: &str) -> std::io::Result<()> {
    file.seek(SeekFrom::End(0))?;
    writeln!(file, "{line}")?;
    file.flush()
}
