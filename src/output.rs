//! # Terminal Output
//!
//! Status lines printed by the CLI. Colors and emojis are used only when the
//! terminal and the user allow it:
//! - `--color=never|always|auto` - CLI flag for color control
//! - `NO_COLOR` - Disables colors when set (per https://no-color.org/)
//! - `CLICOLOR=0` - Disables colors
//! - `CLICOLOR_FORCE=1` - Forces colors even in non-TTY
//! - `TERM=dumb` - Disables colors for dumb terminals
//!
//! ## Usage
//!
//! ```rust,ignore
//! use resource_forge::output::{emoji, OutputConfig};
//!
//! let out = OutputConfig::from_env_and_flag("auto");
//! println!("{} Generating resources...", emoji(&out, "🔨", "[GEN]"));
//! ```

use std::env;

use console::style;

use crate::phases::orchestrator::GenerationReport;
use crate::phases::validate::ValidationOutcome;

/// Whether colors and emojis are used.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
}

impl OutputConfig {
    /// `always` and `never` force the choice, anything else detects it.
    pub fn from_env_and_flag(color_flag: &str) -> Self {
        let use_color = match color_flag.to_lowercase().as_str() {
            "always" => true,
            "never" => false,
            _ => Self::detect_color_support(),
        };
        Self { use_color }
    }

    fn detect_color_support() -> bool {
        if env::var_os("NO_COLOR").is_some() {
            return false;
        }
        if env::var("CLICOLOR").is_ok_and(|v| v == "0") {
            return false;
        }
        if env::var("CLICOLOR_FORCE").is_ok_and(|v| v != "0" && !v.is_empty()) {
            return true;
        }
        if env::var("TERM").is_ok_and(|v| v == "dumb") {
            return false;
        }
        console::Term::stdout().features().colors_supported()
    }

    #[cfg(test)]
    pub fn with_color() -> Self {
        Self { use_color: true }
    }

    #[cfg(test)]
    pub fn without_color() -> Self {
        Self { use_color: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self::from_env_and_flag("auto")
    }
}

/// `emoji_str` when colors are enabled, `plain` otherwise.
pub fn emoji<'a>(config: &OutputConfig, emoji_str: &'a str, plain: &'a str) -> &'a str {
    if config.use_color {
        emoji_str
    } else {
        plain
    }
}

/// One line describing a validation outcome.
pub fn validation_line(config: &OutputConfig, outcome: &ValidationOutcome) -> String {
    match outcome {
        ValidationOutcome::Skipped => format!("{} Validation skipped", emoji(config, "⏭️", "[SKIP]")),
        ValidationOutcome::Passed => format!("{} Validation passed", emoji(config, "✅", "[OK]")),
        ValidationOutcome::Warned(message) => {
            let first = message.lines().next().unwrap_or_default();
            let text = format!("Validation failed (not fatal): {}", first);
            let text = if config.use_color {
                style(text).yellow().to_string()
            } else {
                text
            };
            format!("{} {}", emoji(config, "⚠️", "[WARN]"), text)
        }
    }
}

/// Summary of one platform pass, several lines.
pub fn report_summary(config: &OutputConfig, report: &GenerationReport) -> String {
    let classifier = if config.use_color {
        style(&report.classifier).bold().to_string()
    } else {
        report.classifier.clone()
    };
    let mut lines = vec![format!(
        "{} {}: {} resource(s) written to {}",
        emoji(config, "📦", "[OUT]"),
        classifier,
        report.items,
        report.composite.display()
    )];
    if report.profile_items > 0 {
        lines.push(format!(
            "   {} resource(s) from profile directories",
            report.profile_items
        ));
    }
    lines.push(format!("   {} individual file(s)", report.individual.len()));
    if report.skipped > 0 {
        lines.push(format!(
            "   {} item(s) without a name, no individual file written",
            report.skipped
        ));
    }
    lines.push(format!("   {}", validation_line(config, &report.validation)));
    lines.join("\n")
}
