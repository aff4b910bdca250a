//! Structured command request: verb, opaque arguments, optional director and acting user.

use super::invocation::HEREDOC_TERMINATOR;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("command has no verb")]
    MissingVerb,
    #[error("token {0:?} contains a line break")]
    LineBreak(String),
    #[error("token {0:?} contains the input terminator")]
    Terminator(String),
    #[error("user name {0:?} is not allowed")]
    InvalidUser(String),
}

/// Whether `user` may be substituted into a per-user console config path:
/// non-empty, drawn from `[A-Za-z0-9._@-]`, and neither `.` nor containing `..`.
pub fn valid_user_name(user: &str) -> bool {
    !user.is_empty()
        && user != "."
        && !user.contains("..")
        && user
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '@' | '-'))
}

/// One console command. Tokens after the verb are the console's own syntax (e.g. `pool="Default"`)
/// and are forwarded untouched apart from the hygiene checks in [`CommandRequest::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    tokens: Vec<String>,
    director: Option<String>,
    user: Option<String>,
}

impl CommandRequest {
    /// Build a request from command tokens. The first token is the verb.
    /// Tokens carrying a line break or the heredoc terminator are refused so the
    /// payload fed to the console is always exactly one command line.
    pub fn new<I, S>(tokens: I) -> Result<Self, RequestError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        match tokens.first() {
            Some(verb) if !verb.trim().is_empty() => {}
            _ => return Err(RequestError::MissingVerb),
        }
        for t in &tokens {
            if t.contains('\n') || t.contains('\r') {
                return Err(RequestError::LineBreak(t.clone()));
            }
            if t.contains(HEREDOC_TERMINATOR) {
                return Err(RequestError::Terminator(t.clone()));
            }
        }
        Ok(Self {
            tokens,
            director: None,
            user: None,
        })
    }

    pub fn with_director(mut self, director: Option<impl Into<String>>) -> Self {
        self.director = director.map(Into::into);
        self
    }

    /// Set the acting user. Names that could escape the per-user config template are refused.
    pub fn with_user(mut self, user: Option<impl Into<String>>) -> Result<Self, RequestError> {
        let user: Option<String> = user.map(Into::into);
        if let Some(u) = &user {
            if !valid_user_name(u) {
                return Err(RequestError::InvalidUser(u.clone()));
            }
        }
        self.user = user;
        Ok(self)
    }

    pub fn verb(&self) -> &str {
        &self.tokens[0]
    }

    pub fn args(&self) -> &[String] {
        &self.tokens[1..]
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn director(&self) -> Option<&str> {
        self.director.as_deref()
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Tokens joined with single spaces; this is also the text matched against the console echo.
    pub fn command_text(&self) -> String {
        self.tokens.join(" ")
    }
}
