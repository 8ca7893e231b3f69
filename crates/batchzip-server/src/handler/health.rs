//! Liveness check.

/// Answers `200 ok` without touching any collaborator.
pub async fn health_check() -> &'static str {
    "ok"
}
