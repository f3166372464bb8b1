//! Agent configuration
//!
//! Loaded from `LEAD_*` environment variables. Model credentials live in
//! `llm::LlmConfig`.

use crate::state_machine::state::{default_questions, Question};
use crate::state_machine::QualificationContext;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_LEADS_CSV: &str = "leads.csv";
const DEFAULT_IDLE_THRESHOLD_SECS: u64 = 5;
const DEFAULT_TICK_MILLIS: u64 = 1000;
const DEFAULT_FOLLOW_UP_BUFFER_SECS: u64 = 2;
const DEFAULT_AFFIRMATIONS: &str = "yes,okay,sure";

/// Errors from loading or validating configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("Question list is empty")]
    NoQuestions,

    #[error("Field {0} is asked more than once")]
    DuplicateField(&'static str),

    #[error("Affirmation set is empty")]
    NoAffirmations,

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Runtime settings for one agent.
///
/// `questions` has no environment variable: it defaults to the built-in
/// questionnaire and can only be replaced in code before `validate`.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// CSV file the record store truncates at startup
    pub leads_path: PathBuf,
    pub idle_threshold: Duration,
    /// Scheduler scan period
    pub tick: Duration,
    /// Extra time the demo keeps the scheduler running past the threshold
    pub follow_up_buffer: Duration,
    pub affirmations: Vec<String>,
    /// Ordered prompts, one per profile field
    pub questions: Vec<Question>,
    /// `None` lets generator calls run unbounded
    pub generation_timeout: Option<Duration>,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup, then validate
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secs = |var: &'static str, default: u64| -> Result<Duration, ConfigError> {
            Ok(Duration::from_secs(parse_u64(&lookup, var)?.unwrap_or(default)))
        };

        let affirmations = lookup("LEAD_AFFIRMATIONS")
            .unwrap_or_else(|| DEFAULT_AFFIRMATIONS.to_string())
            .split(',')
            .map(|token| token.trim().to_lowercase())
            .filter(|token| !token.is_empty())
            .collect();

        let config = Self {
            leads_path: lookup("LEADS_CSV")
                .filter(|path| !path.is_empty())
                .map_or_else(|| PathBuf::from(DEFAULT_LEADS_CSV), PathBuf::from),
            idle_threshold: secs("LEAD_IDLE_THRESHOLD_SECS", DEFAULT_IDLE_THRESHOLD_SECS)?,
            tick: Duration::from_millis(
                parse_u64(&lookup, "LEAD_TICK_MILLIS")?.unwrap_or(DEFAULT_TICK_MILLIS),
            ),
            follow_up_buffer: secs("LEAD_FOLLOW_UP_BUFFER_SECS", DEFAULT_FOLLOW_UP_BUFFER_SECS)?,
            affirmations,
            questions: default_questions(),
            generation_timeout: parse_u64(&lookup, "LEAD_GENERATION_TIMEOUT_SECS")?
                .map(Duration::from_secs),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.questions.is_empty() {
            return Err(ConfigError::NoQuestions);
        }

        let mut seen = HashSet::new();
        for question in &self.questions {
            if !seen.insert(question.field) {
                return Err(ConfigError::DuplicateField(question.field.column()));
            }
        }

        if self.affirmations.is_empty() {
            return Err(ConfigError::NoAffirmations);
        }
        if self.idle_threshold.is_zero() {
            return Err(ConfigError::Zero("LEAD_IDLE_THRESHOLD_SECS"));
        }
        if self.tick.is_zero() {
            return Err(ConfigError::Zero("LEAD_TICK_MILLIS"));
        }
        Ok(())
    }

    /// How long the demo consumes the follow-up stream
    pub fn follow_up_window(&self) -> Duration {
        self.idle_threshold + self.follow_up_buffer
    }

    pub fn context(&self) -> QualificationContext {
        QualificationContext::new(self.questions.clone(), &self.affirmations)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            leads_path: PathBuf::from(DEFAULT_LEADS_CSV),
            idle_threshold: Duration::from_secs(DEFAULT_IDLE_THRESHOLD_SECS),
            tick: Duration::from_millis(DEFAULT_TICK_MILLIS),
            follow_up_buffer: Duration::from_secs(DEFAULT_FOLLOW_UP_BUFFER_SECS),
            affirmations: DEFAULT_AFFIRMATIONS.split(',').map(str::to_string).collect(),
            questions: default_questions(),
            generation_timeout: None,
        }
    }
}

fn parse_u64<F>(lookup: &F, var: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { var, value }),
    }
}
