use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    /// Regex for validating login names
    /// Must start with letter or underscore and contain only alphanumeric characters and underscores
    /// - Valid: "john_doe", "user123", "_admin", "JohnDoe"
    /// - Invalid: "123user", "-user", "user-name", "user name"
    pub static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z_][a-zA-Z0-9_]*$").unwrap();
}

/// Reject text that is empty once surrounding whitespace is removed
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("Must not be blank".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_blank() {
        assert!(not_blank("monitor dead").is_ok());
        assert!(not_blank("  x  ").is_ok());
        assert!(not_blank("").is_err());
        assert!(not_blank("   ").is_err());
        assert!(not_blank("\t\n ").is_err());
    }

    #[test]
    fn test_username_regex_valid() {
        assert!(USERNAME_REGEX.is_match("john_doe"));
        assert!(USERNAME_REGEX.is_match("user123"));
        assert!(USERNAME_REGEX.is_match("_admin"));
        assert!(USERNAME_REGEX.is_match("JohnDoe"));
        assert!(USERNAME_REGEX.is_match("a"));
    }

    #[test]
    fn test_username_regex_invalid() {
        assert!(!USERNAME_REGEX.is_match("123user")); // starts with digit
        assert!(!USERNAME_REGEX.is_match("-user")); // starts with hyphen
        assert!(!USERNAME_REGEX.is_match("user-name")); // hyphen
        assert!(!USERNAME_REGEX.is_match("user name")); // space
        assert!(!USERNAME_REGEX.is_match("")); // empty
        assert!(!USERNAME_REGEX.is_match("josé")); // non-ascii
    }
}
