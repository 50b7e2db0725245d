//! Type generation rules and Swift identifier handling.
//!
//! A manifest type name is emitted verbatim, so it must name something the
//! Swift side can refer to directly. Names of types that do not survive the
//! bridge as a concrete class (unit and bottom types, function types, erased
//! generic containers, stream types) have no rule and are rejected.

use std::borrow::Cow;

/// Type names with no generation rule.
const UNBRIDGEABLE: &[&str] = &[
    "Unit",
    "Nothing",
    "List",
    "MutableList",
    "Set",
    "MutableSet",
    "Map",
    "MutableMap",
    "Array",
    "Pair",
    "Triple",
    "Flow",
    "StateFlow",
    "SharedFlow",
];

/// Swift keywords that must be backtick-escaped when used as a name.
const SWIFT_KEYWORDS: &[&str] = &[
    "associatedtype", "class", "deinit", "enum", "extension", "fileprivate", "func", "import",
    "init", "inout", "internal", "let", "open", "operator", "private", "protocol", "public",
    "rethrows", "static", "struct", "subscript", "typealias", "var", "break", "case", "continue",
    "default", "defer", "do", "else", "fallthrough", "for", "guard", "if", "in", "repeat",
    "return", "switch", "where", "while", "as", "catch", "false", "is", "nil", "super", "self",
    "Self", "throw", "throws", "true", "try",
];

/// Why a type name has no generation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Unsupported {
    /// Empty, or not a single identifier.
    #[error("not a type identifier")]
    NotAnIdentifier,
    /// A function type (`Function0`, `Function1`, ...).
    #[error("function types cannot be bridged")]
    FunctionType,
    /// A known type that cannot be bridged as a concrete class.
    #[error("type has no Swift counterpart")]
    Unbridgeable,
}

/// Check that `name` has a generation rule.
pub fn check_type(name: &str) -> Result<(), Unsupported> {
    if !is_identifier(name) {
        return Err(Unsupported::NotAnIdentifier);
    }
    if let Some(arity) = name.strip_prefix("Function") {
        if !arity.is_empty() && arity.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Unsupported::FunctionType);
        }
    }
    if UNBRIDGEABLE.contains(&name) {
        return Err(Unsupported::Unbridgeable);
    }
    Ok(())
}

/// Whether `name` is a single identifier: a letter or `_` followed by
/// letters, digits or `_`.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// `name`, backtick-escaped if it is a Swift keyword.
pub fn escape(name: &str) -> Cow<'_, str> {
    if SWIFT_KEYWORDS.contains(&name) {
        Cow::Owned(format!("`{name}`"))
    } else {
        Cow::Borrowed(name)
    }
}
