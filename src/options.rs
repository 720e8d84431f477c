use regex::Regex;
use std::sync::OnceLock;

static QUOTED_OPTION: OnceLock<Regex> = OnceLock::new();

fn quoted_option() -> &'static Regex {
    QUOTED_OPTION.get_or_init(|| Regex::new(r"'([^']*)'").unwrap())
}

/// Renders a serialized option list such as `['3', '4', '5']` as numbered
/// lines (`0. 3`, `1. 4`, ...).
///
/// Each single-quoted segment keeps its position among all quoted segments
/// as its label, so blank entries are dropped without renumbering the rest.
/// When nothing usable is quoted the whole trimmed input becomes option `0`.
pub fn format_options(raw_options: &str) -> String {
    let formatted: Vec<String> = quoted_option()
        .captures_iter(raw_options)
        .enumerate()
        .filter_map(|(i, caps)| {
            let option = caps[1].trim();
            (!option.is_empty()).then(|| format!("{}. {}", i, option))
        })
        .collect();

    if formatted.is_empty() {
        return format!("0. {}", raw_options.trim());
    }

    formatted.join("\n")
}
