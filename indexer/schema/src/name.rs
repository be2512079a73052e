use crate::{SchemaError, SchemaResult};

/// Maximum length of a module, type, field or enum value name.
pub const MAX_NAME_LENGTH: usize = 63;

/// Human-readable form of the name rule, used in error messages.
pub const NAME_FORMAT: &str = "^[a-zA-Z_][a-zA-Z0-9_]{0,62}$";

/// Same as [`NAME_FORMAT`] but allows a single `.` separating two names.
pub const QUALIFIED_NAME_FORMAT: &str = "^[a-zA-Z_][a-zA-Z0-9_]{0,62}(\\.[a-zA-Z_][a-zA-Z0-9_]{0,62})?$";

/// Returns `true` if `name` is a letter/underscore-led identifier of at most
/// [`MAX_NAME_LENGTH`] ASCII characters.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {},
        _ => return false,
    }

    name.len() <= MAX_NAME_LENGTH && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Returns `true` if `name` is a valid name, or two valid names joined by one `.`.
pub fn is_valid_qualified_name(name: &str) -> bool {
    match name.split_once('.') {
        Some((namespace, rest)) => is_valid_name(namespace) && is_valid_name(rest),
        None => is_valid_name(name),
    }
}

pub fn validate_name(name: &str) -> SchemaResult<()> {
    if name.is_empty() {
        return Err(SchemaError::InvalidName {
            name: name.to_string(),
            reason: "name is empty".to_string(),
        });
    }

    if !is_valid_name(name) {
        return Err(SchemaError::InvalidName {
            name: name.to_string(),
            reason: format!("name must match {NAME_FORMAT}"),
        });
    }

    Ok(())
}

pub fn validate_qualified_name(name: &str) -> SchemaResult<()> {
    if !is_valid_qualified_name(name) {
        return Err(SchemaError::InvalidName {
            name: name.to_string(),
            reason: format!("name must match {QUALIFIED_NAME_FORMAT}"),
        });
    }

    Ok(())
}

// ----------------------------------- tests -----------------------------------

#[cfg(test)]
mod tests {
    use {super::*, test_case::test_case};

    #[test_case("foo" => true; "simple")]
    #[test_case("_foo" => true; "leading underscore")]
    #[test_case("Foo_Bar123" => true; "mixed case with digits")]
    #[test_case("" => false; "empty")]
    #[test_case("1foo" => false; "leading digit")]
    #[test_case("foo-bar" => false; "dash")]
    #[test_case("foo.bar" => false; "dot")]
    #[test_case("fooé" => false; "non ascii")]
    fn name_format(name: &str) -> bool {
        is_valid_name(name)
    }

    #[test]
    fn name_length_limit() {
        let ok = "a".repeat(MAX_NAME_LENGTH);
        let too_long = "a".repeat(MAX_NAME_LENGTH + 1);

        assert!(is_valid_name(&ok));
        assert!(!is_valid_name(&too_long));
    }

    #[test_case("bank" => true; "plain name")]
    #[test_case("bank.Denom" => true; "one dot")]
    #[test_case("bank.denom.extra" => false; "two dots")]
    #[test_case(".denom" => false; "leading dot")]
    #[test_case("bank." => false; "trailing dot")]
    fn qualified_name_format(name: &str) -> bool {
        is_valid_qualified_name(name)
    }
}
