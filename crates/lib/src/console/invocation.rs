//! Composes console invocations.
//!
//! Shape of a command invocation, rendered for `sh -c`:
//!
//! ```text
//! [sudo ]<bin> -c <cfg>[ -D <director>] <<END_OF_DATA
//! <command text>
//! quit
//! END_OF_DATA
//! ```
//!
//! and of the director listing: `[sudo ]<bin> -c <cfg> -l`.
//! This module is the only place where shell text is produced.

use std::borrow::Cow;

use crate::config::ConsoleConfig;

pub const ELEVATION_COMMAND: &str = "sudo";
pub const HEREDOC_TERMINATOR: &str = "END_OF_DATA";
pub const QUIT_COMMAND: &str = "quit";
/// Placeholder in `cfgCustomPath` replaced with the acting user.
pub const USER_KEYWORD: &str = "{user}";

const CONFIG_FLAG: &str = "-c";
const DIRECTOR_FLAG: &str = "-D";
const LIST_DIRECTORS_FLAG: &str = "-l";

/// True when `text` passes through an unquoted heredoc unchanged: no parameter
/// expansion, command substitution or backslash processing can apply to it.
pub fn heredoc_safe(text: &str) -> bool {
    !text.contains(['$', '`', '\\'])
}

/// A fully composed console invocation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    elevate: bool,
    program: String,
    args: Vec<String>,
    stdin: Option<String>,
    command_text: String,
}

impl Invocation {
    /// Program and arguments, elevation prefix included when enabled.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 2);
        if self.elevate {
            argv.push(ELEVATION_COMMAND.to_string());
        }
        argv.push(self.program.clone());
        argv.extend(self.args.iter().cloned());
        argv
    }

    /// Standard input payload: command text, newline, `quit`, newline.
    pub fn stdin(&self) -> Option<&str> {
        self.stdin.as_deref()
    }

    /// The joined command tokens (empty for a director listing).
    pub fn command_text(&self) -> &str {
        &self.command_text
    }

    /// Render as one shell line. Values are quoted only when they hold characters
    /// outside the shell-safe set, so ordinary paths keep their literal form.
    pub fn to_shell_line(&self) -> String {
        let words: Vec<String> = self
            .argv()
            .iter()
            .map(|w| shell_escape::unix::escape(Cow::Borrowed(w.as_str())).into_owned())
            .collect();
        let line = words.join(" ");
        match &self.stdin {
            Some(payload) => format!(
                "{} <<{}\n{}{}\n",
                line, HEREDOC_TERMINATOR, payload, HEREDOC_TERMINATOR
            ),
            None => line,
        }
    }
}

/// Builds invocations from the console configuration. Pure: equal inputs give equal output.
#[derive(Debug, Clone, Copy)]
pub struct InvocationComposer<'a> {
    config: &'a ConsoleConfig,
}

impl<'a> InvocationComposer<'a> {
    pub fn new(config: &'a ConsoleConfig) -> Self {
        Self { config }
    }

    /// Config file for this invocation: the per-user template when both a template and a user
    /// are present, otherwise the primary path.
    pub fn config_path(&self, user: Option<&str>) -> String {
        match (self.config.cfg_custom_path.as_deref(), user) {
            (Some(template), Some(user)) if !template.trim().is_empty() => {
                template.replace(USER_KEYWORD, user)
            }
            _ => self.config.cfg_path.clone(),
        }
    }

    pub fn compose(
        &self,
        director: Option<&str>,
        tokens: &[String],
        user: Option<&str>,
    ) -> Invocation {
        let command_text = tokens.join(" ");
        let mut args = vec![CONFIG_FLAG.to_string(), self.config_path(user)];
        if let Some(d) = director {
            args.push(DIRECTOR_FLAG.to_string());
            args.push(d.to_string());
        }
        let stdin = format!("{}\n{}\n", command_text, QUIT_COMMAND);
        Invocation {
            elevate: self.config.use_sudo,
            program: self.config.bin_path.clone(),
            args,
            stdin: Some(stdin),
            command_text,
        }
    }

    /// Director listing always uses the primary config path.
    pub fn list_directors(&self) -> Invocation {
        Invocation {
            elevate: self.config.use_sudo,
            program: self.config.bin_path.clone(),
            args: vec![
                CONFIG_FLAG.to_string(),
                self.config.cfg_path.clone(),
                LIST_DIRECTORS_FLAG.to_string(),
            ],
            stdin: None,
            command_text: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ConsoleConfig {
        ConsoleConfig {
            bin_path: "/usr/sbin/bconsole".to_string(),
            cfg_path: "/etc/x/bconsole.conf".to_string(),
            cfg_custom_path: Some("/etc/x/bconsole-{user}.conf".to_string()),
            ..ConsoleConfig::default()
        }
    }

    fn tokens(t: &[&str]) -> Vec<String> {
        t.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn plain_status_without_director_or_sudo() {
        let cfg = config();
        let inv = InvocationComposer::new(&cfg).compose(None, &tokens(&["status"]), None);
        assert_eq!(inv.stdin(), Some("status\nquit\n"));
        assert_eq!(
            inv.argv(),
            tokens(&["/usr/sbin/bconsole", "-c", "/etc/x/bconsole.conf"])
        );
        let line = inv.to_shell_line();
        assert_eq!(
            line,
            "/usr/sbin/bconsole -c /etc/x/bconsole.conf <<END_OF_DATA\nstatus\nquit\nEND_OF_DATA\n"
        );
        assert!(!line.contains("sudo"));
        assert!(!line.contains("-D"));
    }

    #[test]
    fn director_and_user_template() {
        let cfg = config();
        let inv = InvocationComposer::new(&cfg).compose(
            Some("mainDirector"),
            &tokens(&["status"]),
            Some("alice"),
        );
        assert_eq!(
            inv.argv(),
            tokens(&[
                "/usr/sbin/bconsole",
                "-c",
                "/etc/x/bconsole-alice.conf",
                "-D",
                "mainDirector"
            ])
        );
        assert!(inv
            .to_shell_line()
            .starts_with("/usr/sbin/bconsole -c /etc/x/bconsole-alice.conf -D mainDirector <<END_OF_DATA\n"));
    }

    #[test]
    fn user_without_template_uses_primary_path() {
        let mut cfg = config();
        cfg.cfg_custom_path = None;
        let c = InvocationComposer::new(&cfg);
        assert_eq!(c.config_path(Some("alice")), "/etc/x/bconsole.conf");
        cfg.cfg_custom_path = Some("  ".to_string());
        let c = InvocationComposer::new(&cfg);
        assert_eq!(c.config_path(Some("alice")), "/etc/x/bconsole.conf");
    }

    #[test]
    fn template_without_user_uses_primary_path() {
        let cfg = config();
        assert_eq!(
            InvocationComposer::new(&cfg).config_path(None),
            "/etc/x/bconsole.conf"
        );
    }

    #[test]
    fn sudo_prefix() {
        let mut cfg = config();
        cfg.use_sudo = true;
        let c = InvocationComposer::new(&cfg);
        let inv = c.compose(None, &tokens(&["version"]), None);
        assert!(inv.to_shell_line().starts_with("sudo /usr/sbin/bconsole -c "));
        assert_eq!(inv.argv()[0], "sudo");
        assert_eq!(
            c.list_directors().to_shell_line(),
            "sudo /usr/sbin/bconsole -c /etc/x/bconsole.conf -l"
        );
    }

    #[test]
    fn list_directors_ignores_user_template_and_has_no_payload() {
        let cfg = config();
        let inv = InvocationComposer::new(&cfg).list_directors();
        assert_eq!(inv.stdin(), None);
        assert_eq!(
            inv.to_shell_line(),
            "/usr/sbin/bconsole -c /etc/x/bconsole.conf -l"
        );
    }

    #[test]
    fn compose_is_deterministic() {
        let cfg = config();
        let c = InvocationComposer::new(&cfg);
        let t = tokens(&["show", "pool=\"Default\""]);
        let a = c.compose(Some("backupDir"), &t, Some("bob")).to_shell_line();
        let b = c.compose(Some("backupDir"), &t, Some("bob")).to_shell_line();
        assert_eq!(a, b);
    }

    #[test]
    fn payload_keeps_tokens_verbatim() {
        let cfg = config();
        let t = tokens(&["run", "job=\"Backup $HOME\"", "yes"]);
        let inv = InvocationComposer::new(&cfg).compose(None, &t, None);
        assert_eq!(inv.command_text(), "run job=\"Backup $HOME\" yes");
        assert_eq!(inv.stdin(), Some("run job=\"Backup $HOME\" yes\nquit\n"));
    }

    #[test]
    fn heredoc_safety() {
        assert!(heredoc_safe("show pool=\"Default\""));
        assert!(heredoc_safe("restore where=\"/tmp/bacula-restores\" yes"));
        assert!(!heredoc_safe("run job=\"$(id)\""));
        assert!(!heredoc_safe("run job=`id`"));
        assert!(!heredoc_safe("restore where=\"C:\\\\tmp\""));
    }

    #[test]
    fn unsafe_user_is_quoted_in_shell_line() {
        let cfg = config();
        let inv = InvocationComposer::new(&cfg).compose(None, &tokens(&["status"]), Some("a b;c"));
        assert!(inv
            .to_shell_line()
            .starts_with("/usr/sbin/bconsole -c '/etc/x/bconsole-a b;c.conf' <<END_OF_DATA\n"));
    }
}
