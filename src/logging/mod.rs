//! Structured logging helpers
//!
//! Filter construction for the tracing subscriber and privacy-safe request
//! previews. Request text is never logged in full; decisions keep at most a
//! short preview.

use crate::config::LoggingConfig;

/// Build filter directives string from LoggingConfig
///
/// Produces `"base_level,switchboard::component=level,..."`. Component
/// directives are emitted in name order.
///
/// # Examples
///
/// ```
/// use switchboard::config::LoggingConfig;
/// use switchboard::logging::build_filter_directives;
/// use std::collections::HashMap;
///
/// let mut component_levels = HashMap::new();
/// component_levels.insert("routing".to_string(), "debug".to_string());
///
/// let config = LoggingConfig {
///     component_levels: Some(component_levels),
///     ..LoggingConfig::default()
/// };
///
/// assert_eq!(build_filter_directives(&config), "info,switchboard::routing=debug");
/// ```
pub fn build_filter_directives(config: &LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    if let Some(component_levels) = &config.component_levels {
        let mut components: Vec<_> = component_levels.iter().collect();
        components.sort();
        for (component, level) in components {
            filter_str.push_str(&format!(",switchboard::{}={}", component, level));
        }
    }

    filter_str
}

/// Truncate text to at most `max_chars` characters, appending `...` when cut.
///
/// Cuts on character boundaries, so multi-byte input never panics.
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_filter_base_level_only() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            ..LoggingConfig::default()
        };
        assert_eq!(build_filter_directives(&config), "warn");
    }

    #[test]
    fn test_filter_component_levels_sorted() {
        let mut levels = HashMap::new();
        levels.insert("telemetry".to_string(), "trace".to_string());
        levels.insert("optimizer".to_string(), "debug".to_string());
        let config = LoggingConfig {
            component_levels: Some(levels),
            ..LoggingConfig::default()
        };
        assert_eq!(
            build_filter_directives(&config),
            "info,switchboard::optimizer=debug,switchboard::telemetry=trace"
        );
    }

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate_preview("hello", 64), "hello");
        assert_eq!(truncate_preview("", 64), "");
    }

    #[test]
    fn test_truncate_long_text() {
        let text = "a".repeat(100);
        let preview = truncate_preview(&text, 64);
        assert_eq!(preview.len(), 67);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_truncate_multibyte() {
        let text = "héllo wörld ".repeat(10);
        let preview = truncate_preview(&text, 5);
        assert_eq!(preview, "héllo...");
    }
}
