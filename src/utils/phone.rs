use regex::Regex;
use std::sync::LazyLock;

const COUNTRY_CODE: &str = "972";
/// Local mobile format: leading zero + 9 digits (e.g. 054xxxxxxx).
const LOCAL_NUMBER_LEN: usize = 10;

static SUBSCRIBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[2-9]\d{7,8}$").expect("valid subscriber regex"));
static DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("valid digits regex"));

/// 将以色列手机号规范化为 E.164 格式（+972...），无法识别时返回 None
///
/// Rules, first match wins:
/// 1. `+972…` with at least 12 characters is kept.
/// 2. `972…` with at least 11 digits gets a `+`.
/// 3. `0` + 9 digits drops the zero.
/// 4. A bare subscriber number `[2-9]` + 7–8 digits.
/// 5. Any other all-digit string gets the country code prepended.
///
/// Rule 5 happily turns foreign or truncated numbers into plausible-looking
/// Israeli ones.
pub fn normalize_israeli_phone(phone: &str) -> Option<String> {
    let cleaned: String = phone
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '+')
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let plus_cc = format!("+{COUNTRY_CODE}");
    if cleaned.starts_with(&plus_cc) && cleaned.len() >= 12 {
        return Some(cleaned);
    }
    if cleaned.starts_with(COUNTRY_CODE) && cleaned.len() >= 11 {
        return Some(format!("+{cleaned}"));
    }
    if cleaned.starts_with('0') && cleaned.len() == LOCAL_NUMBER_LEN {
        return Some(format!("{plus_cc}{}", &cleaned[1..]));
    }
    if SUBSCRIBER_RE.is_match(&cleaned) {
        return Some(format!("{plus_cc}{cleaned}"));
    }
    if DIGITS_RE.is_match(&cleaned) {
        return Some(format!("{plus_cc}{cleaned}"));
    }

    None
}
