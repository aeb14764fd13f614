//! Rate limiting of admin logins using the token bucket algorithm

use citagraph_common::errors::{AppError, Result};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Process-wide limiter for password attempts
pub type LoginRateLimiter = DefaultDirectRateLimiter;

/// Create a new login limiter; zero values are raised to one
pub fn create_login_limiter(per_minute: u32, burst: u32) -> Arc<LoginRateLimiter> {
    let rate = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
    let burst = NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN);
    let quota = Quota::per_minute(rate).allow_burst(burst);

    Arc::new(RateLimiter::direct(quota))
}

/// Take one token or fail with `RateLimited`
pub fn check_login(limiter: &LoginRateLimiter) -> Result<()> {
    limiter.check().map_err(|_| {
        tracing::warn!("Login rate limit exceeded");
        AppError::RateLimited {
            scope: "login".to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = create_login_limiter(10, 5);
        assert!(check_login(&limiter).is_ok());
    }

    #[test]
    fn test_burst_is_enforced() {
        let limiter = create_login_limiter(1, 2);
        assert!(check_login(&limiter).is_ok());
        assert!(check_login(&limiter).is_ok());
        assert!(matches!(check_login(&limiter), Err(AppError::RateLimited { .. })));
    }

    #[test]
    fn test_zero_quota_still_allows_one() {
        let limiter = create_login_limiter(0, 0);
        assert!(check_login(&limiter).is_ok());
    }
}
