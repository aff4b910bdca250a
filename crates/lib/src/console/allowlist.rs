//! Verb allowlist: the gate every request passes before a process is spawned.

use std::collections::BTreeSet;

/// Verbs the console bridge will forward. Dot-prefixed verbs are the console's private query commands.
pub const CONSOLE_VERBS: &[&str] = &[
    "version",
    "status",
    "list",
    "messages",
    "show",
    "mount",
    "umount",
    "release",
    "prune",
    "purge",
    "update",
    "estimate",
    "run",
    ".bvfs_update",
    ".bvfs_lsdirs",
    ".bvfs_lsfiles",
    ".bvfs_versions",
    ".bvfs_get_jobids",
    ".bvfs_restore",
    ".bvfs_clear_cache",
    "restore",
    "cancel",
    "delete",
    ".jobs",
    "label",
    "reload",
    ".fileset",
    ".storage",
    ".client",
    ".pool",
];

/// Set of permitted command verbs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandAllowList {
    verbs: BTreeSet<String>,
}

impl CommandAllowList {
    pub fn new() -> Self {
        Self {
            verbs: BTreeSet::new(),
        }
    }

    /// Permit the given verbs in addition to those already allowed.
    pub fn allow<I, S>(&mut self, verbs: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.verbs.extend(verbs.into_iter().map(Into::into));
    }

    /// True when the trimmed verb is non-empty and allowlisted.
    pub fn is_allowed(&self, verb: &str) -> bool {
        let verb = verb.trim();
        !verb.is_empty() && self.verbs.contains(verb)
    }

    pub fn verbs(&self) -> impl Iterator<Item = &str> {
        self.verbs.iter().map(String::as_str)
    }
}

/// Allowlist with the built-in console verbs.
pub fn console_allowlist() -> CommandAllowList {
    let mut a = CommandAllowList::new();
    a.allow(CONSOLE_VERBS.iter().copied());
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_builtin_verb_is_allowed() {
        let a = console_allowlist();
        for verb in CONSOLE_VERBS {
            assert!(a.is_allowed(verb), "{} should be allowed", verb);
        }
    }

    #[test]
    fn verb_is_trimmed() {
        let a = console_allowlist();
        assert!(a.is_allowed("  status "));
        assert!(a.is_allowed(".bvfs_lsfiles\t"));
    }

    #[test]
    fn unknown_and_empty_verbs_rejected() {
        let a = console_allowlist();
        for verb in [
            "",
            "   ",
            "sqlquery",
            "exit",
            "quit",
            "Status",
            "status;rm",
            "bvfs_lsfiles",
            "@exec",
        ] {
            assert!(!a.is_allowed(verb), "{:?} should be rejected", verb);
        }
    }

    #[test]
    fn allow_extends_set() {
        let mut a = CommandAllowList::new();
        assert!(!a.is_allowed("status"));
        a.allow(["status"]);
        assert!(a.is_allowed("status"));
        assert_eq!(a.verbs().collect::<Vec<_>>(), vec!["status"]);
    }
}
