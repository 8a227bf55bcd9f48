//! Per-user request rate limiting.
//!
//! Each authenticated user gets a GCRA bucket the first time they are seen.
//! Buckets live for the whole process; the map only grows.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use dashmap::DashMap;
use governor::clock::{Clock, DefaultClock};
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

use crate::config::RateLimitConfig;
use crate::error::AppError;
use crate::extractors::auth::AuthUser;
use crate::state::AppState;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

pub struct UserRateLimiter {
    quota: Quota,
    buckets: DashMap<i32, Arc<DirectRateLimiter>>,
    clock: DefaultClock,
}

impl UserRateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        let period = if config.requests_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / config.requests_per_second)
        } else {
            Duration::from_secs(1)
        };
        let burst = NonZeroU32::new(config.burst).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(burst);

        Self {
            quota,
            buckets: DashMap::new(),
            clock: DefaultClock::default(),
        }
    }

    /// Take one cell from the user's bucket, creating it on first use.
    ///
    /// On rejection returns the number of whole seconds until a retry can succeed.
    pub fn check(&self, user_id: i32) -> Result<(), u64> {
        let limiter = self
            .buckets
            .entry(user_id)
            .or_insert_with(|| Arc::new(RateLimiter::direct(self.quota)))
            .clone();

        limiter.check().map_err(|not_until| {
            let wait = not_until.wait_time_from(self.clock.now());
            wait.as_secs_f64().ceil().max(1.0) as u64
        })
    }

    pub fn tracked_users(&self) -> usize {
        self.buckets.len()
    }
}

/// Middleware rejecting requests from users that exhausted their bucket.
pub async fn enforce(
    State(state): State<AppState>,
    auth_user: AuthUser,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Err(retry_after) = state.rate_limiter.check(auth_user.user_id) {
        tracing::debug!(user_id = auth_user.user_id, retry_after, "Rate limit exceeded");
        return Err(AppError::RateLimited { retry_after });
    }
    Ok(next.run(request).await)
}
