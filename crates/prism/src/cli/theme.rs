//! Terminal styling for prompts and status output.

use console::{style, Style};
use dialoguer::theme::ColorfulTheme;

/// Dialoguer theme used for confirmations.
pub fn prism_theme() -> ColorfulTheme {
    ColorfulTheme {
        prompt_prefix: style("?".to_string()).for_stderr().magenta(),
        prompt_style: Style::new().for_stderr().bold(),
        prompt_suffix: style("›".to_string()).for_stderr().bright().black(),
        success_prefix: style("✓".to_string()).for_stderr().green(),
        success_suffix: style("·".to_string()).for_stderr().bright().black(),
        error_prefix: style("✗".to_string()).for_stderr().red(),
        error_style: Style::new().for_stderr().red(),
        values_style: Style::new().for_stderr().green(),
        ..ColorfulTheme::default()
    }
}

/// A `key: value` status line with a dimmed key.
pub fn field(key: &str, value: impl std::fmt::Display) -> String {
    let key = format!("{key}:");
    format!("  {} {}", style(format!("{key:<14}")).dim(), value)
}

/// Green check line.
pub fn ok(message: &str) -> String {
    format!("{} {}", style("✓").green(), message)
}

/// Yellow warning line.
pub fn warn(message: &str) -> String {
    format!("{} {}", style("!").yellow().bold(), message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_contains_key_and_value() {
        console::set_colors_enabled(false);
        assert_eq!(field("prompts", 42), format!("  {:<14} 42", "prompts:"));
    }
}
