use regex::Regex;
use std::sync::OnceLock;

static ANSWER_PATTERN: OnceLock<Regex> = OnceLock::new();

fn answer_pattern() -> &'static Regex {
    ANSWER_PATTERN
        .get_or_init(|| Regex::new(r"(?i)ответ\s*:\s*(\d+)").unwrap())
}

/// Code points of the `0` of every Unicode decimal digit run (category Nd).
/// Each run holds the digits 0-9 at consecutive code points.
const DIGIT_ZEROS: &[u32] = &[
    0x0030, 0x0660, 0x06F0, 0x07C0, 0x0966, 0x09E6, 0x0A66, 0x0AE6, 0x0B66,
    0x0BE6, 0x0C66, 0x0CE6, 0x0D66, 0x0DE6, 0x0E50, 0x0ED0, 0x0F20, 0x1040,
    0x1090, 0x17E0, 0x1810, 0x1946, 0x19D0, 0x1A80, 0x1A90, 0x1B50, 0x1BB0,
    0x1C40, 0x1C50, 0xA620, 0xA8D0, 0xA900, 0xA9D0, 0xA9F0, 0xAA50, 0xABF0,
    0xFF10, 0x104A0, 0x10D30, 0x11066, 0x110F0, 0x11136, 0x111D0, 0x112F0,
    0x11450, 0x114D0, 0x11650, 0x116C0, 0x11730, 0x118E0, 0x11950, 0x11C50,
    0x11D50, 0x11DA0, 0x11F50, 0x16A60, 0x16AC0, 0x16B50, 0x1D7CE, 0x1D7D8,
    0x1D7E2, 0x1D7EC, 0x1D7F6, 0x1E140, 0x1E2F0, 0x1E4F0, 0x1E950, 0x1FBF0,
];

/// Numeric value of a decimal digit from any script.
fn digit_value(c: char) -> Option<u32> {
    let code = c as u32;
    let zero = match DIGIT_ZEROS.binary_search(&code) {
        Ok(i) => DIGIT_ZEROS[i],
        Err(0) => return None,
        Err(i) => DIGIT_ZEROS[i - 1],
    };
    let value = code - zero;
    (value < 10).then_some(value)
}

/// Finds the first `ответ: <n>` marker in model output and returns `n`.
///
/// The keyword is matched case-insensitively anywhere in the text, so
/// reasoning before the marker and commentary after it are ignored. Digits
/// from any script count (`ответ: ３` is 3). Returns `None` when no marker is
/// present or the digit run does not fit in an `i64`.
pub fn extract_answer(text: &str) -> Option<i64> {
    let caps = answer_pattern().captures(text)?;
    caps[1].chars().try_fold(0i64, |acc, c| {
        acc.checked_mul(10)?.checked_add(i64::from(digit_value(c)?))
    })
}
