//! Logging sink for console activity.
//!
//! Records carry the command (or operation name), its payload, a category, and the
//! source location. Categories map onto `log` targets so they can be filtered with
//! `RUST_LOG=bridge::execute=debug` and similar.

use std::fmt::Debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Execute,
    External,
    Application,
    General,
    Security,
}

impl Category {
    pub fn target(self) -> &'static str {
        match self {
            Category::Execute => "bridge::execute",
            Category::External => "bridge::external",
            Category::Application => "bridge::application",
            Category::General => "bridge::general",
            Category::Security => "bridge::security",
        }
    }
}

pub fn record(category: Category, command: &str, output: &dyn Debug, file: &str, line: u32) {
    log::debug!(
        target: category.target(),
        "Command={}, Output={:?}, File={}, Line={}",
        command,
        output,
        file,
        line
    );
}

/// `log_console!(category, command, output)` records with the caller's file and line.
#[macro_export]
macro_rules! log_console {
    ($category:expr, $command:expr, $output:expr) => {
        $crate::console::logging::record($category, &$command, &$output, file!(), line!())
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_are_distinct() {
        let all = [
            Category::Execute,
            Category::External,
            Category::Application,
            Category::General,
            Category::Security,
        ];
        let mut targets: Vec<_> = all.iter().map(|c| c.target()).collect();
        targets.sort();
        targets.dedup();
        assert_eq!(targets.len(), all.len());
    }

    #[test]
    fn record_without_logger_is_a_no_op() {
        crate::log_console!(Category::General, "status", vec!["ok".to_string()]);
    }
}
