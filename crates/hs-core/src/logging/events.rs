//! Structured event definitions for logging.
//!
//! JSONL output follows one schema: every line is a serialized
//! [`LogEvent`], with the run id and stage taken from the enclosing span
//! when the event itself does not carry them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Log levels for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup, configuration, input loading.
    Init,
    /// Fitting candidate models.
    Train,
    /// Comparing candidates per category.
    Select,
    /// Scoring test items.
    Recognize,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Train => "train",
            Stage::Select => "select",
            Stage::Recognize => "recognize",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "init" => Ok(Stage::Init),
            "train" => Ok(Stage::Train),
            "select" => Ok(Stage::Select),
            "recognize" => Ok(Stage::Recognize),
            _ => Err(format!("unknown stage: {}", s)),
        }
    }
}

/// Standard event names, used as tracing targets.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Selection
    pub const SELECT_STARTED: &str = "select.started";
    pub const SELECT_CANDIDATE: &str = "select.candidate";
    pub const SELECT_TRAIN_FAILED: &str = "select.train_failed";
    pub const SELECT_SCORE_FAILED: &str = "select.score_failed";
    pub const SELECT_NO_VIABLE_MODEL: &str = "select.no_viable_model";
    pub const SELECT_FINISHED: &str = "select.finished";

    // Recognition
    pub const RECOGNIZE_STARTED: &str = "recognize.started";
    pub const RECOGNIZE_SCORE_FAILED: &str = "recognize.score_failed";
    pub const RECOGNIZE_FINISHED: &str = "recognize.finished";

    // Config/init
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const INPUT_LOADED: &str = "input.loaded";

    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// A structured log event for JSONL output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub ts: DateTime<Utc>,

    pub level: Level,

    /// Event name (e.g. "select.candidate").
    pub event: String,

    /// Unique ID of this hmm-select invocation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<Stage>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Additional structured fields.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl LogEvent {
    pub fn new(level: Level, event: impl Into<String>) -> Self {
        LogEvent {
            ts: Utc::now(),
            level,
            event: event.into(),
            run_id: None,
            stage: None,
            message: None,
            fields: serde_json::Map::new(),
        }
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage = Some(stage);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Add a field to the event.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.fields.insert(key.into(), v);
        }
        self
    }

    /// Serialize to a single JSON line.
    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(
                r#"{{"error":"serialization_failed","event":"{}"}}"#,
                self.event
            )
        })
    }
}

/// Per-invocation logging context.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub run_id: String,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
        }
    }

    /// Span carrying the run id; events inside it (including those from
    /// library code and rayon workers that re-enter it) inherit the id.
    pub fn span(&self, stage: Stage) -> tracing::Span {
        tracing::info_span!("run", run_id = %self.run_id, stage = %stage)
    }
}
