//! Casing helpers for class names

/// Upper-case the first character, leaving the rest untouched.
///
/// Used for inline definition and property class names: `address` ->
/// `Address`, `firstName` -> `FirstName`.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Convert a snake_case or kebab-case name to PascalCase.
///
/// Used to derive class names from file stems: `street_address` ->
/// `StreetAddress`.
pub fn to_pascal_case(name: &str) -> String {
    name.split(|c| c == '_' || c == '-' || c == ' ')
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalize_upper_cases_first_char_only() {
        assert_eq!(capitalize("address"), "Address");
        assert_eq!(capitalize("firstName"), "FirstName");
        assert_eq!(capitalize("Address"), "Address");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn pascal_case_joins_separated_parts() {
        assert_eq!(to_pascal_case("street_address"), "StreetAddress");
        assert_eq!(to_pascal_case("person"), "Person");
        assert_eq!(to_pascal_case("book-entry"), "BookEntry");
    }
}
