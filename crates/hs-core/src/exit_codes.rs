//! Exit codes for the hmm-select CLI.
//!
//! Ranges:
//! - 0-9: operational outcomes (parse outcome from code, not output)
//! - 10-19: user/environment errors (fixable by the caller)
//! - 20-29: internal and I/O errors

use hs_common::Error;

/// Exit codes for hmm-select operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Every category got a model and every item got a guess.
    Clean = 0,

    /// Some categories had no viable model or some items no guess.
    Partial = 1,

    /// Invalid arguments or input documents.
    ArgsError = 10,

    /// Configuration file missing, unreadable, or invalid.
    ConfigError = 11,

    /// Internal error (bug - please report).
    InternalError = 20,

    /// I/O error.
    IoError = 21,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Codes below 10 are outcomes, not errors.
    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Get the code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Clean => "OK_CLEAN",
            ExitCode::Partial => "OK_PARTIAL",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::InternalError => "ERR_INTERNAL",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::Config(_) | Error::InvalidConfig(_) => ExitCode::ConfigError,
            Error::Corpus(_)
            | Error::Json(_)
            | Error::UnknownCategory(_)
            | Error::Recognition(_) => ExitCode::ArgsError,
            Error::Io(_) => ExitCode::IoError,
            Error::NoViableModel { .. } => ExitCode::InternalError,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
