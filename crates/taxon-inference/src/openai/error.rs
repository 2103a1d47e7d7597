//! HTTP status to error-category mapping.

use taxon_core::Error;

/// Convert a non-success HTTP status into the matching error category.
///
/// Named categories (rate limit, unavailable, timeout) map to their explicit
/// variants so the retry classifier never inspects provider-specific error
/// bodies; everything else keeps its status for the status-set check.
pub fn error_from_status(status: u16, message: String) -> Error {
    match status {
        429 => Error::RateLimited(message),
        503 => Error::ServiceUnavailable(message),
        408 => Error::Timeout(message),
        _ => Error::Http { status, message },
    }
}
