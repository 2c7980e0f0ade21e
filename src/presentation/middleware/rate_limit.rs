//! Rate Limiting Middleware
//!
//! Redis sliding-window rate limiting with three tiers: login/registration,
//! the contact form, and the rest of the API. Without Redis, or when
//! `rate_limit.enabled` is off, every request passes. Redis failures also
//! let the request through.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use redis::aio::ConnectionManager;
use serde::Serialize;

use crate::config::RateLimitSettings;
use crate::infrastructure::cache::keys;
use crate::presentation::middleware::auth::AuthUser;
use crate::shared::error::ErrorResponse;
use crate::startup::AppState;

/// Rate limit tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitTier {
    /// Login, registration and token refresh
    Auth,
    /// Public contact form submissions
    Contact,
    /// Everything else under `/api`
    Api,
}

/// Requests allowed per window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub limit: u32,
    pub window_seconds: u64,
}

impl RateLimitTier {
    pub fn policy(&self, settings: &RateLimitSettings) -> RateLimitPolicy {
        match self {
            RateLimitTier::Auth => RateLimitPolicy {
                limit: 10,
                window_seconds: 60,
            },
            RateLimitTier::Contact => RateLimitPolicy {
                limit: 5,
                window_seconds: 3600,
            },
            RateLimitTier::Api => RateLimitPolicy {
                limit: (settings.requests_per_second * 60.0).max(1.0) as u32 + settings.burst_size,
                window_seconds: 60,
            },
        }
    }

    fn name(&self) -> &'static str {
        match self {
            RateLimitTier::Auth => "auth",
            RateLimitTier::Contact => "contact",
            RateLimitTier::Api => "api",
        }
    }
}

/// Rate limit state reported to clients.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitInfo {
    pub limit: u32,
    pub remaining: u32,
    /// Unix timestamp when the window resets
    pub reset_at: i64,
    pub retry_after: u64,
}

#[derive(Debug, Serialize)]
struct RateLimitExceededResponse {
    #[serde(flatten)]
    error: ErrorResponse,
    rate_limit: RateLimitInfo,
}

// KEYS[1] = window key
// ARGV = now_ms, window_start_ms, limit, window_seconds
const SLIDING_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local now_ms = tonumber(ARGV[1])
local window_start = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])
local window_seconds = tonumber(ARGV[4])

redis.call('ZREMRANGEBYSCORE', key, '-inf', window_start)
local count = redis.call('ZCARD', key)

if count < limit then
    redis.call('ZADD', key, now_ms, now_ms .. ':' .. math.random(1000000))
    redis.call('EXPIRE', key, window_seconds + 1)
    return {1, count + 1, 0}
end

local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
local retry_ms = 0
if oldest and #oldest >= 2 then
    retry_ms = oldest[2] + (window_seconds * 1000) - now_ms
end
return {0, count, retry_ms}
"#;

/// Redis sliding-window limiter for one tier.
#[derive(Clone)]
pub struct RateLimiter {
    redis: ConnectionManager,
    tier: RateLimitTier,
    policy: RateLimitPolicy,
}

impl RateLimiter {
    pub fn new(redis: ConnectionManager, tier: RateLimitTier, settings: &RateLimitSettings) -> Self {
        Self {
            redis,
            tier,
            policy: tier.policy(settings),
        }
    }

    /// `Ok` when the request is allowed, `Err` when the window is full.
    pub async fn check(&self, client: &str) -> Result<RateLimitInfo, RateLimitInfo> {
        let key = keys::rate_limit(self.tier.name(), client);
        let now_ms = chrono::Utc::now().timestamp_millis();
        let window_ms = (self.policy.window_seconds * 1000) as i64;
        let reset_at = now_ms / 1000 + self.policy.window_seconds as i64;

        let mut conn = self.redis.clone();
        let result: Result<Vec<i64>, _> = redis::Script::new(SLIDING_WINDOW_SCRIPT)
            .key(&key)
            .arg(now_ms)
            .arg(now_ms - window_ms)
            .arg(self.policy.limit as i64)
            .arg(self.policy.window_seconds as i64)
            .invoke_async(&mut conn)
            .await;

        let result = match result {
            Ok(values) if values.len() >= 3 => values,
            Ok(values) => {
                tracing::error!(?values, "Unexpected rate limiter script result");
                return Ok(self.open_info(reset_at));
            }
            Err(e) => {
                tracing::error!(error = %e, tier = self.tier.name(), "Rate limiter Redis error");
                return Ok(self.open_info(reset_at));
            }
        };

        let allowed = result[0] == 1;
        let count = result[1].max(0) as u32;
        let info = RateLimitInfo {
            limit: self.policy.limit,
            remaining: self.policy.limit.saturating_sub(count),
            reset_at,
            retry_after: if allowed {
                0
            } else {
                (result[2].max(0) as u64).div_ceil(1000)
            },
        };

        if allowed {
            Ok(info)
        } else {
            Err(info)
        }
    }

    fn open_info(&self, reset_at: i64) -> RateLimitInfo {
        RateLimitInfo {
            limit: self.policy.limit,
            remaining: self.policy.limit,
            reset_at,
            retry_after: 0,
        }
    }
}

/// Identify the caller: authenticated user first, then proxy headers, then
/// the socket address.
fn client_identifier(request: &Request, peer: Option<IpAddr>) -> String {
    if let Some(user) = request.extensions().get::<AuthUser>() {
        return format!("user:{}", user.user_id);
    }

    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .or_else(|| {
            request
                .headers()
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .map(str::trim)
        })
        .and_then(|ip| ip.parse::<IpAddr>().ok());

    match forwarded.or(peer) {
        Some(ip) => format!("ip:{}", ip),
        None => "ip:unknown".to_string(),
    }
}

pub async fn rate_limit_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    enforce(state, request, next, RateLimitTier::Auth).await
}

pub async fn rate_limit_contact(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    enforce(state, request, next, RateLimitTier::Contact).await
}

pub async fn rate_limit_api(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    enforce(state, request, next, RateLimitTier::Api).await
}

async fn enforce(
    state: AppState,
    request: Request,
    next: Next,
    tier: RateLimitTier,
) -> Response {
    let redis = match (&state.redis, state.settings.rate_limit.enabled) {
        (Some(redis), true) => redis.clone(),
        _ => return next.run(request).await,
    };

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip());
    let client = client_identifier(&request, peer);
    let limiter = RateLimiter::new(redis, tier, &state.settings.rate_limit);

    match limiter.check(&client).await {
        Ok(info) => {
            let mut response = next.run(request).await;
            add_rate_limit_headers(response.headers_mut(), &info);
            response
        }
        Err(info) => {
            tracing::warn!(client = %client, tier = tier.name(), "Rate limit exceeded");
            rate_limited_response(info)
        }
    }
}

fn add_rate_limit_headers(headers: &mut HeaderMap, info: &RateLimitInfo) {
    for (name, value) in [
        ("x-ratelimit-limit", info.limit as i64),
        ("x-ratelimit-remaining", info.remaining as i64),
        ("x-ratelimit-reset", info.reset_at),
    ] {
        headers.insert(name, HeaderValue::from(value));
    }
}

fn rate_limited_response(info: RateLimitInfo) -> Response {
    let info = RateLimitInfo {
        remaining: 0,
        ..info
    };
    let body = RateLimitExceededResponse {
        error: ErrorResponse {
            code: 10006,
            message: "Too many requests, please slow down".to_string(),
            errors: None,
        },
        rate_limit: info.clone(),
    };

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    let headers = response.headers_mut();
    headers.insert(header::RETRY_AFTER, HeaderValue::from(info.retry_after));
    add_rate_limit_headers(headers, &info);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserRole;
    use axum::body::Body;

    fn settings() -> RateLimitSettings {
        RateLimitSettings {
            enabled: true,
            requests_per_second: 2.0,
            burst_size: 10,
        }
    }

    #[test]
    fn test_api_policy_from_settings() {
        let policy = RateLimitTier::Api.policy(&settings());
        assert_eq!(policy.limit, 130);
        assert_eq!(policy.window_seconds, 60);
    }

    #[test]
    fn test_contact_stricter_than_auth() {
        let auth = RateLimitTier::Auth.policy(&settings());
        let contact = RateLimitTier::Contact.policy(&settings());
        assert!(contact.limit < auth.limit);
        assert!(contact.window_seconds > auth.window_seconds);
    }

    #[test]
    fn test_identifier_prefers_user() {
        let mut request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::empty())
            .unwrap();
        request.extensions_mut().insert(AuthUser {
            user_id: 42,
            role: UserRole::Customer,
        });
        assert_eq!(client_identifier(&request, None), "user:42");
    }

    #[test]
    fn test_identifier_uses_first_forwarded_ip() {
        let request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_identifier(&request, None), "ip:203.0.113.7");
    }

    #[test]
    fn test_identifier_ignores_garbage_header() {
        let request = Request::builder()
            .header("x-forwarded-for", "not-an-ip")
            .body(Body::empty())
            .unwrap();
        let peer: IpAddr = "198.51.100.2".parse().unwrap();
        assert_eq!(client_identifier(&request, Some(peer)), "ip:198.51.100.2");
    }

    #[test]
    fn test_limited_response_sets_retry_after() {
        let response = rate_limited_response(RateLimitInfo {
            limit: 5,
            remaining: 3,
            reset_at: 1_700_000_000,
            retry_after: 12,
        });
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "12");
        assert_eq!(response.headers().get("x-ratelimit-remaining").unwrap(), "0");
    }
}
