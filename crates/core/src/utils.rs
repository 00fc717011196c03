//! Common helpers for Python code generation.
//!
//! Case conversion, string literal quoting, indentation and identifier checks
//! shared by the route translator and the renderers.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Python hard keywords; none of them may be used as an identifier.
pub static PYTHON_KEYWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
        "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
        "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
        "try", "while", "with", "yield",
    ]
    .into_iter()
    .collect()
});

/// Indentation unit of generated code.
pub const INDENT: &str = "    ";

/// Check whether `name` is usable as a Python identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first == '_' || first.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
        && !PYTHON_KEYWORDS.contains(name)
}

fn words(s: &str) -> impl Iterator<Item = &str> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
}

/// Convert to UpperCamelCase, keeping existing inner capitals.
///
/// `"FastAPI_Client"` becomes `"FastAPIClient"`, `"app-client"` becomes `"AppClient"`.
pub fn to_upper_camel_case(s: &str) -> String {
    words(s)
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect()
}

/// Convert to snake_case, splitting acronyms from the following word.
///
/// `"FastAPI"` becomes `"fast_api"`, `"HTTPValidationError"` becomes
/// `"http_validation_error"`.
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for word in words(s) {
        if !result.is_empty() {
            result.push('_');
        }
        let chars: Vec<char> = word.chars().collect();
        for (i, &c) in chars.iter().enumerate() {
            if c.is_uppercase() && i > 0 {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
                if prev.is_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_uppercase() && next_is_lower)
                {
                    result.push('_');
                }
            }
            result.extend(c.to_lowercase());
        }
    }
    result
}

/// Render `s` as a double-quoted Python string literal.
pub fn dq_str_repr(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Indent every non-empty line of `text` by `depth` levels of four spaces.
pub fn indent(text: &str, depth: usize) -> String {
    if text.is_empty() {
        return String::new();
    }
    let prefix = INDENT.repeat(depth);
    let mut out = text
        .lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    if text.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Name of the `http.HTTPStatus` member for a status code, if there is one.
pub fn http_status_name(code: u16) -> Option<&'static str> {
    let name = match code {
        100 => "CONTINUE",
        101 => "SWITCHING_PROTOCOLS",
        102 => "PROCESSING",
        103 => "EARLY_HINTS",
        200 => "OK",
        201 => "CREATED",
        202 => "ACCEPTED",
        203 => "NON_AUTHORITATIVE_INFORMATION",
        204 => "NO_CONTENT",
        205 => "RESET_CONTENT",
        206 => "PARTIAL_CONTENT",
        207 => "MULTI_STATUS",
        208 => "ALREADY_REPORTED",
        226 => "IM_USED",
        300 => "MULTIPLE_CHOICES",
        301 => "MOVED_PERMANENTLY",
        302 => "FOUND",
        303 => "SEE_OTHER",
        304 => "NOT_MODIFIED",
        305 => "USE_PROXY",
        307 => "TEMPORARY_REDIRECT",
        308 => "PERMANENT_REDIRECT",
        400 => "BAD_REQUEST",
        401 => "UNAUTHORIZED",
        402 => "PAYMENT_REQUIRED",
        403 => "FORBIDDEN",
        404 => "NOT_FOUND",
        405 => "METHOD_NOT_ALLOWED",
        406 => "NOT_ACCEPTABLE",
        407 => "PROXY_AUTHENTICATION_REQUIRED",
        408 => "REQUEST_TIMEOUT",
        409 => "CONFLICT",
        410 => "GONE",
        411 => "LENGTH_REQUIRED",
        412 => "PRECONDITION_FAILED",
        413 => "CONTENT_TOO_LARGE",
        414 => "URI_TOO_LONG",
        415 => "UNSUPPORTED_MEDIA_TYPE",
        416 => "RANGE_NOT_SATISFIABLE",
        417 => "EXPECTATION_FAILED",
        418 => "IM_A_TEAPOT",
        421 => "MISDIRECTED_REQUEST",
        422 => "UNPROCESSABLE_CONTENT",
        423 => "LOCKED",
        424 => "FAILED_DEPENDENCY",
        425 => "TOO_EARLY",
        426 => "UPGRADE_REQUIRED",
        428 => "PRECONDITION_REQUIRED",
        429 => "TOO_MANY_REQUESTS",
        431 => "REQUEST_HEADER_FIELDS_TOO_LARGE",
        451 => "UNAVAILABLE_FOR_LEGAL_REASONS",
        500 => "INTERNAL_SERVER_ERROR",
        501 => "NOT_IMPLEMENTED",
        502 => "BAD_GATEWAY",
        503 => "SERVICE_UNAVAILABLE",
        504 => "GATEWAY_TIMEOUT",
        505 => "HTTP_VERSION_NOT_SUPPORTED",
        506 => "VARIANT_ALSO_NEGOTIATES",
        507 => "INSUFFICIENT_STORAGE",
        508 => "LOOP_DETECTED",
        510 => "NOT_EXTENDED",
        511 => "NETWORK_AUTHENTICATION_REQUIRED",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("foo"));
        assert!(is_identifier("_foo2"));
        assert!(is_identifier("match"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2foo"));
        assert!(!is_identifier("foo-bar"));
        assert!(!is_identifier("class"));
        assert!(!is_identifier("None"));
    }

    #[test]
    fn test_to_upper_camel_case() {
        assert_eq!(to_upper_camel_case("FastAPI_Client"), "FastAPIClient");
        assert_eq!(to_upper_camel_case("app-client"), "AppClient");
        assert_eq!(to_upper_camel_case("birthday app"), "BirthdayApp");
        assert_eq!(to_upper_camel_case(""), "");
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("FastAPI"), "fast_api");
        assert_eq!(to_snake_case("FastAPIClient"), "fast_api_client");
        assert_eq!(to_snake_case("HTTPValidationError"), "http_validation_error");
        assert_eq!(to_snake_case("itemId"), "item_id");
        assert_eq!(to_snake_case("Birthday App"), "birthday_app");
        assert_eq!(to_snake_case("v2Client"), "v2_client");
    }

    #[test]
    fn test_dq_str_repr() {
        assert_eq!(dq_str_repr("foo\"bar"), "\"foo\\\"bar\"");
        assert_eq!(dq_str_repr("a\\b"), "\"a\\\\b\"");
        assert_eq!(dq_str_repr("line\nbreak"), "\"line\\nbreak\"");
        assert_eq!(dq_str_repr(""), "\"\"");
    }

    #[test]
    fn test_indent() {
        assert_eq!(indent("", 2), "");
        assert_eq!(indent("a\n\nb\n", 1), "    a\n\n    b\n");
        assert_eq!(indent("x", 2), "        x");
    }

    #[test]
    fn test_http_status_name() {
        assert_eq!(http_status_name(200), Some("OK"));
        assert_eq!(http_status_name(422), Some("UNPROCESSABLE_CONTENT"));
        assert_eq!(http_status_name(299), None);
    }
}
