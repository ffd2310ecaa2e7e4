//! Status-code classification
//!
//! The pipeline's success/failure split and the coarse categories used when
//! logging or inspecting application errors.

/// Highest status still decoded as a success payload.
///
/// Inclusive: a bare `300 Multiple Choices` is treated as success, everything
/// above it as an application failure.
pub const SUCCESS_STATUS_CEILING: u16 = 300;

/// Whether a response with this status is decoded into the success type
pub fn is_success_status(status: u16) -> bool {
    status <= SUCCESS_STATUS_CEILING
}

/// Helper function to classify HTTP errors by category
pub fn classify_status(status: u16) -> &'static str {
    match status {
        400 => "validation",
        401 => "authentication",
        403 => "authorization",
        404 => "not_found",
        408 => "timeout",
        409 => "conflict",
        429 => "rate_limit",
        500..=599 => "server",
        _ if is_success_status(status) => "success",
        _ => "unknown",
    }
}
