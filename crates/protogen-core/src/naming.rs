//! Naming convention utilities for schema generation.
//!
//! Every transform here is deterministic and total: any input string yields
//! some output, possibly empty, and never panics.
//!
//! # Supported Conversions
//!
//! | Input | Function | Output |
//! |-------|----------|--------|
//! | `DisplayName` | [`to_lower_snake_case`] | `display_name` |
//! | `DisplayName` | [`to_upper_snake_case`] | `DISPLAY_NAME` |
//! | `word` | [`capitalize`] | `Word` |
//! | `Word` | [`lower_first`] | `word` |
//! | `a/b-c.d` | [`to_schema_package`] | `a.bc.d` |

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Convert an identifier to lower snake case.
///
/// An underscore is inserted before an uppercase letter unless it is the
/// first character or follows another uppercase letter, so acronyms stay
/// glued together.
///
/// # Examples
///
/// ```
/// use protogen_core::naming::to_lower_snake_case;
///
/// assert_eq!(to_lower_snake_case("DisplayName"), "display_name");
/// assert_eq!(to_lower_snake_case("Arg1"), "arg1");
/// assert_eq!(to_lower_snake_case("HTTPServer"), "httpserver");
/// ```
pub fn to_lower_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut last_was_upper = false;

    for (i, c) in s.chars().enumerate() {
        let is_upper = c.is_uppercase();
        if is_upper && i != 0 && !last_was_upper {
            result.push('_');
        }
        last_was_upper = is_upper;
        result.extend(c.to_lowercase());
    }

    result
}

/// Convert an identifier to upper snake case.
///
/// ```
/// use protogen_core::naming::to_upper_snake_case;
///
/// assert_eq!(to_upper_snake_case("DisplayName"), "DISPLAY_NAME");
/// ```
pub fn to_upper_snake_case(s: &str) -> String {
    to_lower_snake_case(s).to_uppercase()
}

/// Capitalize the first letter of a string.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Lower-case the first letter of a string.
pub fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().chain(chars).collect(),
    }
}

/// Derive a schema package name from a module import path.
///
/// Path separators (`/`, `::`) and literal dots become a single dot, runs of
/// separators collapse, and leading or trailing separators are dropped.
/// Diacritics are stripped through canonical decomposition, and anything
/// that is not an ASCII letter or digit is discarded.
///
/// # Examples
///
/// ```
/// use protogen_core::naming::to_schema_package;
///
/// assert_eq!(to_schema_package("a/b-c.d"), "a.bc.d");
/// assert_eq!(to_schema_package("my_crate::models"), "mycrate.models");
/// assert_eq!(to_schema_package("café/crème"), "cafe.creme");
/// ```
pub fn to_schema_package(path: &str) -> String {
    let stripped: String = path
        .replace("::", "/")
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .nfc()
        .collect();

    let mut result = String::with_capacity(stripped.len());
    for c in stripped.chars() {
        if c == '/' || c == '.' {
            if !result.is_empty() && !result.ends_with('.') {
                result.push('.');
            }
        } else if c.is_ascii_alphanumeric() {
            result.push(c);
        }
    }

    while result.ends_with('.') {
        result.pop();
    }

    result
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use test_case::test_case;

    #[test_case("DisplayName", "display_name")]
    #[test_case("display_name", "display_name")]
    #[test_case("Arg1", "arg1")]
    #[test_case("Result12", "result12")]
    #[test_case("HTTPServer", "httpserver")]
    #[test_case("userID", "user_id")]
    #[test_case("X", "x")]
    #[test_case("", "")]
    fn to_lower_snake_case___converts(input: &str, expected: &str) {
        assert_eq!(to_lower_snake_case(input), expected);
    }

    #[test]
    fn to_upper_snake_case___upper_cases_snake_form() {
        assert_eq!(to_upper_snake_case("Active"), "ACTIVE");
        assert_eq!(to_upper_snake_case("NotStarted"), "NOT_STARTED");
        assert_eq!(to_upper_snake_case("already_snake"), "ALREADY_SNAKE");
    }

    #[test]
    fn capitalize___capitalizes_first_letter() {
        assert_eq!(capitalize("foo"), "Foo");
        assert_eq!(capitalize("Foo"), "Foo");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn lower_first___lowers_first_letter_only() {
        assert_eq!(lower_first("FooService"), "fooService");
        assert_eq!(lower_first("foo"), "foo");
        assert_eq!(lower_first(""), "");
    }

    #[test_case("a/b-c.d", "a.bc.d")]
    #[test_case("github.com/org/repo", "github.com.org.repo")]
    #[test_case("my_crate::models", "mycrate.models")]
    #[test_case("a//b", "a.b")]
    #[test_case("/leading/trailing/", "leading.trailing")]
    #[test_case("ñandú/pingüino", "nandu.pinguino")]
    #[test_case("v1.2", "v1.2")]
    #[test_case("---", "")]
    fn to_schema_package___sanitizes(input: &str, expected: &str) {
        assert_eq!(to_schema_package(input), expected);
    }

    #[test]
    fn to_schema_package___output_is_ascii_letters_digits_and_dots() {
        let name = to_schema_package("日本/façade-x.y_z::w");

        assert!(
            name.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '.')
        );
        assert_eq!(name, "facadex.yz.w");
    }
}
