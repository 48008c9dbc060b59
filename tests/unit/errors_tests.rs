/*!
 * Tests for error types and the per-paragraph error marker
 */

use doctran::errors::{AppError, ProviderError, SinkError, StoreError};
use doctran::translation::unit::{error_sentinel, is_error_text};

#[test]
fn test_errorSentinel_shouldNameFailureKind() {
    let sentinel = error_sentinel(&ProviderError::RateLimitExceeded("slow down".to_string()));
    assert_eq!(sentinel, "[ERROR: translation failed - RateLimitExceeded]");
    assert!(is_error_text(&sentinel));
    assert!(!is_error_text("Bonjour"));
}

#[test]
fn test_providerError_display_shouldIncludeStatus() {
    let error = ProviderError::ApiError {
        status_code: 502,
        message: "bad gateway".to_string(),
    };
    assert_eq!(error.to_string(), "API responded with error: 502 - bad gateway");
    assert_eq!(error.kind(), "ApiError");
}

#[test]
fn test_appError_fromStoreError_shouldWrap() {
    let error: AppError = StoreError::NotFound("term 'x'".to_string()).into();
    assert!(matches!(error, AppError::Store(StoreError::NotFound(_))));
    assert!(error.to_string().contains("term 'x'"));
}

#[test]
fn test_sinkError_encode_shouldCarryCause() {
    let error = SinkError::Encode("key must be a string".to_string());
    assert_eq!(error.to_string(), "Failed to encode event: key must be a string");
    assert_ne!(error, SinkError::Disconnected);
}
