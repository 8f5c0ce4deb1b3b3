//! Askama filters shared by storefront templates.

use std::fmt::Display;

/// Year for the footer copyright line: `{{ ""|current_year }}`.
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// `"s"` unless the count is exactly one: `item{{ n|plural_s }}`.
#[allow(clippy::unnecessary_wraps)]
#[askama::filter_fn]
pub fn plural_s(count: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(suffix(&count.to_string()))
}

fn suffix(count: &str) -> &'static str {
    if count == "1" { "" } else { "s" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural_suffix() {
        assert_eq!(suffix("1"), "");
        assert_eq!(suffix("0"), "s");
        assert_eq!(suffix("12"), "s");
    }
}
