//! Liveness and readiness endpoints.

use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::{HttpResponse, get, web};

/// Shared readiness flag flipped once the server is wired up.
#[derive(Debug, Default)]
pub struct HealthState {
    ready: AtomicBool,
}

impl HealthState {
    /// Create a not-yet-ready state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the service ready to accept traffic.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Whether the service is ready.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}

/// Liveness probe: the process is up.
#[get("/healthz/live")]
pub async fn live() -> HttpResponse {
    HttpResponse::Ok().finish()
}

/// Readiness probe: the server finished wiring its dependencies.
#[get("/healthz/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    if state.is_ready() {
        HttpResponse::Ok().finish()
    } else {
        HttpResponse::ServiceUnavailable().finish()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn readiness_flips_once_marked() {
        let state = HealthState::new();
        assert!(!state.is_ready());
        state.mark_ready();
        assert!(state.is_ready());
    }
}
