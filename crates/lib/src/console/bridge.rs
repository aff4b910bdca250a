//! The bridge: validates, composes, runs, and parses one console command per call.

use std::fmt::Debug;
use std::sync::Arc;

use serde::Serialize;

use super::allowlist::{console_allowlist, CommandAllowList};
use super::envelope::{NormalizedResult, Output};
use super::error::ErrorCode;
use super::invocation::{heredoc_safe, Invocation, InvocationComposer};
use super::logging::Category;
use super::request::{CommandRequest, RequestError};
use super::runner::{ProcessRunner, SubprocessRunner};
use super::transcript::{EchoStrip, TranscriptStrategy};
use crate::config::{Config, ConsoleConfig, ExecMode};
use crate::log_console;

/// Directors reported by the console's list mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectorList {
    pub output: Vec<String>,
    pub error: ErrorCode,
}

impl DirectorList {
    fn failure(code: ErrorCode) -> Self {
        Self {
            output: vec![code.message().to_string(), String::new()],
            error: code,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_ok()
    }

    /// True only for a successful listing that names `director`.
    pub fn contains(&self, director: &str) -> bool {
        self.is_ok() && self.output.iter().any(|d| d == director)
    }

    pub fn into_result(self) -> NormalizedResult {
        if self.is_ok() {
            NormalizedResult::ok(Output::Lines(self.output))
        } else {
            NormalizedResult::failure(self.error)
        }
    }
}

/// Console command bridge. Holds no per-request state; directors are re-listed on every
/// validation because the console's set can change between calls.
#[derive(Clone)]
pub struct Bridge {
    config: ConsoleConfig,
    allowlist: CommandAllowList,
    runner: Arc<dyn ProcessRunner>,
    transcript: Arc<dyn TranscriptStrategy>,
    debug: bool,
}

impl Bridge {
    pub fn new(config: ConsoleConfig) -> Self {
        let runner = SubprocessRunner::from_config(&config);
        Self {
            config,
            allowlist: console_allowlist(),
            runner: Arc::new(runner),
            transcript: Arc::new(EchoStrip),
            debug: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.console.clone()).with_debug(config.debug)
    }

    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_transcript(mut self, transcript: Arc<dyn TranscriptStrategy>) -> Self {
        self.transcript = transcript;
        self
    }

    pub fn with_allowlist(mut self, allowlist: CommandAllowList) -> Self {
        self.allowlist = allowlist;
        self
    }

    /// Enable execute-category records for every invocation.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn console_config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn allowlist(&self) -> &CommandAllowList {
        &self.allowlist
    }

    /// Run the console in list mode; each output line is one director.
    pub fn list_directors(&self) -> DirectorList {
        let invocation = InvocationComposer::new(&self.config).list_directors();
        let list = match self.runner.run(&invocation) {
            Ok(exec) if exec.success() => DirectorList {
                output: exec.lines().to_vec(),
                error: ErrorCode::NoError,
            },
            Ok(exec) => {
                log::warn!("listing directors exited with status {}", exec.exit_status());
                DirectorList::failure(ErrorCode::ConnectionProblem)
            }
            Err(e) => {
                log::warn!("listing directors failed: {}", e);
                DirectorList::failure(ErrorCode::from(&e))
            }
        };
        self.trace(&invocation, &list);
        list
    }

    /// Ok when `director` is currently listed. A failed listing is a connection problem,
    /// not an invalid director.
    pub fn resolve_director(&self, director: &str) -> Result<(), ErrorCode> {
        let list = self.list_directors();
        if !list.is_ok() {
            return Err(list.error);
        }
        if list.contains(director) {
            Ok(())
        } else {
            Err(ErrorCode::InvalidDirector)
        }
    }

    pub fn is_valid_director(&self, director: &str) -> bool {
        self.resolve_director(director).is_ok()
    }

    /// Execute a validated request.
    pub fn execute(&self, request: &CommandRequest) -> NormalizedResult {
        if !self.allowlist.is_allowed(request.verb()) {
            log::debug!("verb not allowlisted: {:?}", request.verb());
            return NormalizedResult::failure(ErrorCode::InvalidCommand);
        }
        if self.config.exec_mode == ExecMode::Shell
            && !request.tokens().iter().all(|t| heredoc_safe(t))
        {
            log_console!(
                Category::Security,
                request.command_text(),
                "refused: shell expansion characters in heredoc payload"
            );
            return NormalizedResult::failure(ErrorCode::InvalidCommand);
        }
        if let Some(director) = request.director() {
            if let Err(code) = self.resolve_director(director) {
                return NormalizedResult::failure(code);
            }
        }

        let invocation = InvocationComposer::new(&self.config).compose(
            request.director(),
            request.tokens(),
            request.user(),
        );
        let result = match self.runner.run(&invocation) {
            Ok(exec) => self.transcript.parse(&exec, invocation.command_text()),
            Err(e) => {
                log::warn!("console invocation failed: {}", e);
                NormalizedResult::failure(ErrorCode::from(&e))
            }
        };
        self.trace(&invocation, &result);
        result
    }

    /// Build a request from raw tokens and execute it. Malformed tokens give `InvalidCommand`.
    pub fn command<I, S>(&self, director: Option<&str>, tokens: I, user: Option<&str>) -> NormalizedResult
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match CommandRequest::new(tokens).and_then(|r| r.with_director(director).with_user(user)) {
            Ok(request) => self.execute(&request),
            Err(e @ RequestError::InvalidUser(_)) => {
                log_console!(Category::Security, e.to_string(), "refused: acting user name");
                NormalizedResult::failure(ErrorCode::from(&e))
            }
            Err(e) => {
                log::debug!("rejected command: {}", e);
                NormalizedResult::failure(ErrorCode::from(&e))
            }
        }
    }

    /// Try a candidate console setup: list its directors and run `tokens` against the first one.
    /// Per-user config templates are not used.
    pub fn probe<I, S>(&self, bin_path: &str, cfg_path: &str, use_sudo: bool, tokens: I) -> NormalizedResult
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let candidate = Bridge {
            config: ConsoleConfig {
                bin_path: bin_path.to_string(),
                cfg_path: cfg_path.to_string(),
                cfg_custom_path: None,
                use_sudo,
                ..self.config.clone()
            },
            ..self.clone()
        };
        let directors = candidate.list_directors();
        if !directors.is_ok() {
            return NormalizedResult::failure(directors.error);
        }
        let first = directors.output.first().cloned();
        candidate.command(first.as_deref(), tokens, None)
    }

    fn trace(&self, invocation: &Invocation, output: &dyn Debug) {
        if self.debug {
            log_console!(Category::Execute, invocation.to_shell_line(), output);
        }
    }
}
