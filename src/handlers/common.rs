use crate::{
    auth::AuthenticatedUser,
    config::AppConfig,
    entities::business,
    errors::{ApiError, ServiceError},
    services::Page,
    AppState,
};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// Standard no content response
pub fn no_content_response() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Validate request input
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ApiError> {
    input
        .validate()
        .map_err(|e| ApiError::ValidationError(format!("Validation failed: {}", e)))
}

/// Map service errors to API errors
pub fn map_service_error(err: ServiceError) -> ApiError {
    ApiError::ServiceError(err)
}

/// Loads the business named in the path and checks the caller owns it
pub async fn authorized_business(
    state: &AppState,
    user: &AuthenticatedUser,
    business_id: Uuid,
) -> Result<business::Model, ApiError> {
    state
        .services
        .businesses
        .authorize(&user.user_id, business_id)
        .await
        .map_err(map_service_error)
}

/// Pagination parameters for list operations
#[derive(Debug, Deserialize, Serialize)]
pub struct PaginationParams {
    #[serde(default = "default_page")]
    pub page: u64,
    /// Falls back to the configured default page size
    pub per_page: Option<u64>,
}

fn default_page() -> u64 {
    1
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: None,
        }
    }
}

/// A page request resolved against the configured bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub per_page: u64,
}

impl PageWindow {
    /// Zero-based row offset
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> u64 {
        self.per_page
    }
}

impl PaginationParams {
    pub fn resolve(&self, config: &AppConfig) -> PageWindow {
        PageWindow {
            page: self.page.max(1),
            per_page: config.page_size(self.per_page),
        }
    }
}

/// Standard pagination response metadata
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(page: u64, per_page: u64, total: u64) -> Self {
        let total_pages = if total == 0 || per_page == 0 {
            0
        } else {
            total.div_ceil(per_page)
        };
        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

/// Standard paginated response wrapper
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, page: u64, per_page: u64, total: u64) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(page, per_page, total),
        }
    }

    pub fn from_page(page: Page<T>, window: PageWindow) -> Self {
        Self::new(page.items, window.page, window.per_page, page.total)
    }
}

/// Serializes one page of results in the list envelope
pub fn paginated_response<T: Serialize>(page: Page<T>, window: PageWindow) -> Response {
    success_response(PaginatedResponse::from_page(page, window))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn config() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".into(),
            "unit_test_signing_secret_with_plenty_of_entropy_42".into(),
            "test".into(),
        )
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(20, 1)]
    #[case(21, 2)]
    #[case(100, 5)]
    fn total_pages_rounds_up(#[case] total: u64, #[case] expected: u64) {
        assert_eq!(PaginationMeta::new(1, 20, total).total_pages, expected);
    }

    #[test]
    fn page_size_is_clamped_to_configured_maximum() {
        let cfg = config();
        let window = PaginationParams {
            page: 3,
            per_page: Some(10_000),
        }
        .resolve(&cfg);
        assert_eq!(window.per_page, cfg.api_max_page_size);
        assert_eq!(window.offset(), 2 * cfg.api_max_page_size);
    }

    #[test]
    fn page_zero_is_treated_as_first_page() {
        let window = PaginationParams {
            page: 0,
            per_page: Some(5),
        }
        .resolve(&config());
        assert_eq!(window.page, 1);
        assert_eq!(window.offset(), 0);
    }

    #[test]
    fn huge_page_numbers_saturate_the_offset() {
        let window = PaginationParams {
            page: u64::MAX,
            per_page: Some(50),
        }
        .resolve(&config());
        assert_eq!(window.offset(), u64::MAX);
    }

    #[test]
    fn missing_per_page_uses_default() {
        let cfg = config();
        let window = PaginationParams::default().resolve(&cfg);
        assert_eq!(window.per_page, cfg.api_default_page_size);
    }
}
