const GO_KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

/// Names every generated accessor refers to, a parameter or column local must not shadow them.
pub const RESERVED_NAMES: &[&str] = &[
    // locals and receiver
    "ctx", "conn", "err", "q",
    // packages
    "context", "fmt", "sql",
    // predeclared types and values
    "any", "bool", "error", "int", "string", "nil", "true", "false",
    // blank identifier, cannot be scanned into or returned
    "_",
];

/// Turns an arbitrary name into a Go identifier.
///
/// Returns `None` for an empty name, there is nothing sensible to derive from it.
pub fn to_identifier(name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    let mut ident = String::with_capacity(name.len() + 1);
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        ident.push('_');
    }
    ident.extend(name.chars().map(|c| match c.is_ascii_alphanumeric() || c == '_' {
        true => c,
        false => '_',
    }));
    if GO_KEYWORDS.contains(&ident.as_str()) {
        ident.push('_');
    }
    Some(ident)
}

pub fn is_reserved(ident: &str) -> bool {
    RESERVED_NAMES.contains(&ident)
}
