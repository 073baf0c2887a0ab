//! Field-name conversion between in-memory and wire naming conventions.
//!
//! Descriptor fields are declared in upper-camel-case (`MinDate`) while the
//! wire uses snake_case (`min_date`). [`convert`] flips a name to the other
//! convention based on its first character.

/// Converts `name` to the opposite naming convention.
///
/// - Upper-camel-case input (`MinDate`) becomes snake_case (`min_date`).
/// - snake_case input (`min_date`) becomes upper-camel-case (`MinDate`).
/// - Anything else is returned unchanged.
///
/// # Examples
///
/// ```
/// use restmap::naming::convert;
///
/// assert_eq!(convert("CluesCount"), "clues_count");
/// assert_eq!(convert("clues_count"), "CluesCount");
/// assert_eq!(convert("_private"), "_private");
/// ```
pub fn convert(name: &str) -> String {
    match name.chars().next() {
        Some(c) if c.is_uppercase() => to_snake_case(name),
        Some(c) if c.is_lowercase() => to_upper_camel_case(name),
        _ => name.to_string(),
    }
}

/// Inserts `_` before every upper-case letter and lower-cases the result.
///
/// A leading upper-case letter gets no separator.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Upper-cases the first letter and every letter following `_`, then drops
/// the underscores.
pub fn to_upper_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = true;
    for c in name.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Maps declared field names to the keys written on the wire.
///
/// The client applies its policy to query keys and body-field keys. Path
/// placeholders are never renamed.
pub trait NamingPolicy: Send + Sync {
    /// Returns the wire key for a declared field name.
    fn wire_name(&self, name: &str) -> String;
}

/// The default policy: upper-camel-case names go out as snake_case.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnakePascal;

impl NamingPolicy for SnakePascal {
    fn wire_name(&self, name: &str) -> String {
        convert(name)
    }
}

/// Writes declared names as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl NamingPolicy for Verbatim {
    fn wire_name(&self, name: &str) -> String {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upper_camel_to_snake() {
        assert_eq!(convert("Id"), "id");
        assert_eq!(convert("MinDate"), "min_date");
        assert_eq!(convert("CategoryId"), "category_id");
    }

    #[test]
    fn test_snake_to_upper_camel() {
        assert_eq!(convert("id"), "Id");
        assert_eq!(convert("min_date"), "MinDate");
        assert_eq!(convert("clues_count"), "CluesCount");
    }

    #[test]
    fn test_other_leading_characters_unchanged() {
        assert_eq!(convert(""), "");
        assert_eq!(convert("_id"), "_id");
        assert_eq!(convert("9lives"), "9lives");
    }

    #[test]
    fn test_round_trip_is_stable() {
        for name in ["Id", "Value", "MinDate", "CluesCount", "AirDateFrom", "A"] {
            let snake = convert(name);
            assert_eq!(convert(&snake), name);
            assert_eq!(convert(&convert(&snake)), snake);
        }
    }

    #[test]
    fn test_policies() {
        assert_eq!(SnakePascal.wire_name("MaxDate"), "max_date");
        assert_eq!(Verbatim.wire_name("MaxDate"), "MaxDate");
    }
}
