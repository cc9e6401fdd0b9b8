use axum::Json;
use serde::Serialize;

use crate::error::AppError;

/// Success envelope wrapping every response payload.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ApiResponse<T> {
    /// Always `true`.
    #[schema(example = true)]
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Validate a trimmed title-like field (1-256 Unicode characters).
pub fn validate_title(value: &str, field: &str) -> Result<(), AppError> {
    let value = value.trim();
    if value.is_empty() || value.chars().count() > 256 {
        return Err(AppError::Validation(format!(
            "{field} must be 1-256 characters"
        )));
    }
    Ok(())
}

/// Validate a free-text body (non-empty, at most 1MB).
pub fn validate_text(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() || value.len() > 1_000_000 {
        return Err(AppError::Validation(format!(
            "{field} must be non-empty and at most 1MB"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_bounds() {
        assert!(validate_title("  ", "Title").is_err());
        assert!(validate_title(&"x".repeat(257), "Title").is_err());
        assert!(validate_title(&"é".repeat(256), "Title").is_ok());
    }

    #[test]
    fn envelope_serializes_success_flag() {
        let Json(body) = ApiResponse::ok(5);
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value, serde_json::json!({"success": true, "data": 5}));
    }
}
