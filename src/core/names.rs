//! Identifier normalization for raw TMDL tokens.
//!
//! TMDL identifiers arrive with a mix of quoting conventions (`'Fact Sales'`,
//! `` `Dim Date` ``, `"Margin %"`), trailing `lineageTag` annotations, and
//! sometimes the whole `name = expression` head of a declaration. Everything
//! downstream (dependency search, relationship dedup, visual matching) keys
//! on the normalized form produced here.

/// Normalizes a raw table/measure/column name captured from a declaration.
///
/// Rules, in order:
/// 1. Anything from the first `=` onwards is dropped (declaration heads).
/// 2. Anything from a `lineageTag` marker onwards is dropped.
/// 3. A matching wrapping quote pair (`'` or `` ` ``) is removed.
/// 4. Remaining quote characters are stripped and the result trimmed.
pub fn clean_name(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let mut name = raw;
    if let Some(idx) = name.find('=') {
        name = &name[..idx];
    }
    if let Some(idx) = name.find("lineageTag") {
        name = &name[..idx];
    }
    let mut name = name.trim();

    let bytes = name.as_bytes();
    if name.len() >= 2 {
        let first = bytes[0];
        if (first == b'\'' || first == b'`') && bytes[name.len() - 1] == first {
            name = &name[1..name.len() - 1];
        }
    }

    name.replace(['"', '\'', '`'], "").trim().to_string()
}

/// Normalizes a column reference from a relationship field.
pub fn clean_ref(reference: &str) -> String {
    reference.replace(['\'', '"'], "").trim().to_string()
}
