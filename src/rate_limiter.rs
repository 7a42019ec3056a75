use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Sliding window rate limiter for API endpoints
/// Uses request counts per time window rather than intervals
pub struct ApiRateLimiter {
    /// Maximum requests per window
    max_requests: u32,
    /// Window duration
    window: Duration,
    /// Requests by key (typically client identifier)
    requests: Mutex<HashMap<String, Vec<Instant>>>,
}

impl ApiRateLimiter {
    /// Create a new API rate limiter
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(window_secs),
            requests: Mutex::new(HashMap::new()),
        }
    }

    /// Check if request is allowed and record it
    /// Returns true if allowed, false if rate limited
    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let cutoff = now - self.window;

        let mut requests = match self.requests.lock() {
            Ok(r) => r,
            Err(_) => return true, // Fail open on lock error
        };

        let timestamps = requests.entry(key.to_string()).or_insert_with(Vec::new);

        // Remove expired entries
        timestamps.retain(|t| *t > cutoff);

        if timestamps.len() >= self.max_requests as usize {
            false
        } else {
            timestamps.push(now);
            true
        }
    }

    /// Cleanup old entries to prevent memory growth
    pub fn cleanup(&self) {
        let cutoff = Instant::now() - self.window;

        if let Ok(mut requests) = self.requests.lock() {
            requests.retain(|_, timestamps| {
                timestamps.retain(|t| *t > cutoff);
                !timestamps.is_empty()
            });
        }
    }
}

/// Pre-configured rate limiters for the scan endpoints. Both trigger
/// outbound traffic (page fetch, WHOIS, DNS) per request, so they get
/// tighter limits than read-only endpoints would.
pub struct ApiRateLimiters {
    /// Feature extraction: 30 per minute
    pub extract: ApiRateLimiter,
    /// Full predictions: 15 per minute
    pub predict: ApiRateLimiter,
}

impl ApiRateLimiters {
    pub fn new() -> Self {
        Self {
            extract: ApiRateLimiter::new(30, 60),
            predict: ApiRateLimiter::new(15, 60),
        }
    }

    /// Cleanup all limiters (call periodically)
    pub fn cleanup_all(&self) {
        self.extract.cleanup();
        self.predict.cleanup();
    }
}

impl Default for ApiRateLimiters {
    fn default() -> Self {
        Self::new()
    }
}
