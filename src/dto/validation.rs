//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates that a player name is non-empty and free of control characters.
///
/// Names are compared exactly, so surrounding whitespace is kept as given.
///
/// # Examples
///
/// ```ignore
/// validate_player_name("Ann")     // Ok
/// validate_player_name("")        // Err - empty
/// validate_player_name("Ann\n")   // Err - control character
/// ```
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        let mut err = ValidationError::new("player_name_empty");
        err.message = Some("Player name must not be empty".into());
        return Err(err);
    }

    if name.chars().any(char::is_control) {
        let mut err = ValidationError::new("player_name_format");
        err.message = Some("Player name must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}
