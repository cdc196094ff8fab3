//! HTTP client with rate limiting for the KKBOX APIs.
//!
//! This module provides a wrapper around `reqwest::Client` that adds:
//! * Request rate limiting, so retry loops cannot hammer the service
//! * Consistent timeouts and headers
//! * The user agent of the Android client
//!
//! # Rate Limiting
//!
//! API calls are limited to 50 per 5-second interval, allowing bursts up to
//! that amount. Requests that would exceed the limit are delayed. Audio
//! downloads go through [`Client::unlimited`] and are not throttled.
//!
//! # Example
//!
//! ```rust
//! use kkstream::http::Client;
//!
//! let client = Client::new(&config)?;
//! let request = client.unlimited.get(url).build()?;
//! let response = client.execute(request).await?;
//! ```

use std::{future::Future, num::NonZeroU32, time::Duration};

use futures_util::{FutureExt, TryFutureExt};
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};

use crate::{config::Config, error::Result};

/// HTTP client with built-in rate limiting.
pub struct Client {
    /// Unlimited request client for special cases.
    ///
    /// Direct access to underlying client without rate limiting. Used to
    /// build requests and to stream audio.
    pub unlimited: reqwest::Client,

    /// Rate limiter for API calls.
    rate_limiter: DefaultDirectRateLimiter,
}

impl Client {
    /// Rolling window of the rate limit.
    const RATE_LIMIT_INTERVAL: Duration = Duration::from_secs(5);

    /// Maximum allowed API calls per interval.
    const RATE_LIMIT_CALLS_PER_INTERVAL: u8 = 50;

    /// Duration to keep idle connections alive.
    const KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Duration to wait for individual network reads.
    ///
    /// Applies per read, so long audio downloads are not cut off as long as
    /// data keeps flowing.
    const READ_TIMEOUT: Duration = Duration::from_secs(30);

    /// Duration to wait for a connection to be established.
    const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built, for example when no
    /// TLS backend is available.
    ///
    /// # Panics
    ///
    /// Panics if rate limit parameters are zero.
    pub fn new(config: &Config) -> Result<Self> {
        // Not having `Accept-Language` set is non-fatal.
        let mut headers = HeaderMap::new();
        if let Ok(lang) = HeaderValue::from_str(&config.app_lang) {
            headers.insert(ACCEPT_LANGUAGE, lang);
        }

        let http_client = reqwest::Client::builder()
            .tcp_keepalive(Self::KEEPALIVE_TIMEOUT)
            .read_timeout(Self::READ_TIMEOUT)
            .connect_timeout(Self::CONNECT_TIMEOUT)
            .default_headers(headers)
            .user_agent(&config.user_agent);

        let replenish_interval =
            Self::RATE_LIMIT_INTERVAL / u32::from(Self::RATE_LIMIT_CALLS_PER_INTERVAL);
        let quota = Quota::with_period(replenish_interval)
            .expect("quota time interval is zero")
            .allow_burst(
                NonZeroU32::new(Self::RATE_LIMIT_CALLS_PER_INTERVAL.into())
                    .expect("calls per interval is zero"),
            );

        Ok(Self {
            unlimited: http_client.build()?,
            rate_limiter: governor::RateLimiter::direct(quota),
        })
    }

    /// Executes a request with rate limiting.
    ///
    /// # Errors
    ///
    /// Returns error if the request cannot be sent or no response arrives.
    /// The HTTP status is not checked here.
    pub fn execute(
        &self,
        request: reqwest::Request,
    ) -> impl Future<Output = Result<reqwest::Response>> + '_ {
        // No need to await with jitter because the level of concurrency is low.
        let throttle = self.rate_limiter.until_ready();
        throttle.then(|()| self.unlimited.execute(request).map_err(Into::into))
    }
}
