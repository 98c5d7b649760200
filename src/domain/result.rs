//! Result type alias for Packrat

use super::errors::PackratError;

/// Result type alias for Packrat operations
///
/// # Examples
///
/// ```
/// use packrat::domain::result::Result;
/// use packrat::domain::errors::PackratError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(PackratError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, PackratError>;
