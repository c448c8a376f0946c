//! Validation helpers for DTOs.

use validator::ValidationError;

/// Maximum length of a participant nickname, in characters.
const NICKNAME_MAX_CHARS: usize = 20;

/// Validates that a nickname is 1 to 20 characters once trimmed.
pub fn validate_nickname(nickname: &str) -> Result<(), ValidationError> {
    let trimmed = nickname.trim();

    if trimmed.is_empty() {
        let mut err = ValidationError::new("nickname_empty");
        err.message = Some("Nickname must not be empty".into());
        return Err(err);
    }

    if trimmed.chars().count() > NICKNAME_MAX_CHARS {
        let mut err = ValidationError::new("nickname_length");
        err.message = Some(
            format!(
                "Nickname must be at most {NICKNAME_MAX_CHARS} characters (got {})",
                trimmed.chars().count()
            )
            .into(),
        );
        return Err(err);
    }

    Ok(())
}

/// Validates that a title is non-empty once trimmed.
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        let mut err = ValidationError::new("title_empty");
        err.message = Some("Title must not be empty".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_nickname_valid() {
        assert!(validate_nickname("Ana").is_ok());
        assert!(validate_nickname("  padded  ").is_ok());
        assert!(validate_nickname("exactly-twenty-chars").is_ok());
    }

    #[test]
    fn test_validate_nickname_invalid() {
        assert!(validate_nickname("").is_err());
        assert!(validate_nickname("   ").is_err());
        assert!(validate_nickname("this nickname is way too long").is_err());
    }

    #[test]
    fn test_validate_title() {
        assert!(validate_title("Summer bash").is_ok());
        assert!(validate_title("  ").is_err());
    }
}
