//! SQL utilities for PostgreSQL identifier handling.

/// Quote a PostgreSQL identifier unconditionally.
///
/// Always wraps the identifier in double quotes and escapes any embedded
/// double quotes by doubling them.
pub fn quote_ident(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Render an identifier for generated SQL, quoting only when needed.
///
/// Lower-case names made of letters, digits and underscores are emitted as-is.
pub fn display_ident(s: &str) -> String {
    let plain = s
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if plain {
        s.to_string()
    } else {
        quote_ident(s)
    }
}

/// Strip surrounding double quotes from an identifier, undoubling embedded ones.
///
/// Unquoted identifiers are returned unchanged (no case folding; dumps emit
/// lower-case names for unquoted identifiers already).
pub fn unquote_ident(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        s[1..s.len() - 1].replace("\"\"", "\"")
    } else {
        s.to_string()
    }
}

/// Split a possibly schema-qualified name into `(schema, name)`.
///
/// Both parts are unquoted. Returns `None` for the schema when unqualified.
pub fn split_qualified(name: &str) -> (Option<String>, String) {
    let mut in_quotes = false;
    for (i, c) in name.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '.' if !in_quotes => {
                return (
                    Some(unquote_ident(&name[..i])),
                    unquote_ident(&name[i + 1..]),
                )
            }
            _ => {}
        }
    }
    (None, unquote_ident(name))
}
