// In-memory request throttling shared across handlers: a sliding-window
// limiter and a TTL idempotency cache, both lock-protected with explicit
// expiry sweeps

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Sliding-window rate limiter keyed by client identifier.
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    hits: Mutex<HashMap<String, Vec<Instant>>>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Record one request for `key` and report whether it is allowed.
    /// Entries older than the window are pruned on every call.
    pub fn check(&self, key: &str) -> bool {
        let mut hits = match self.hits.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let now = Instant::now();
        // checked_sub: the window may be longer than process uptime
        if let Some(start) = now.checked_sub(self.window) {
            // Sweep every client, dropping keys with no hits left in the
            // window so one-off clients do not accumulate in the map
            hits.retain(|_, timestamps| {
                timestamps.retain(|t| *t > start);
                !timestamps.is_empty()
            });
        }

        let timestamps = hits.entry(key.to_string()).or_default();
        if timestamps.len() >= self.max_requests {
            return false;
        }
        timestamps.push(now);
        true
    }

    #[cfg(test)]
    fn client_count(&self) -> usize {
        self.hits.lock().map(|h| h.len()).unwrap_or(0)
    }
}

/// Replay cache for requests carrying an Idempotency-Key header. Entries
/// expire after the TTL and are swept on insert so the cache cannot grow
/// without bound.
pub struct IdempotencyCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, serde_json::Value)>>,
}

impl IdempotencyCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.get(key).and_then(|(stored_at, value)| {
            if stored_at.elapsed() < self.ttl {
                Some(value.clone())
            } else {
                None
            }
        })
    }

    pub fn put(&self, key: &str, value: serde_json::Value) {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let ttl = self.ttl;
        entries.retain(|_, (stored_at, _)| stored_at.elapsed() < ttl);
        entries.insert(key.to_string(), (Instant::now(), value));
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }
}
