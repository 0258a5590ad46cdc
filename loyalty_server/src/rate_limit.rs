//! A per-client sliding window rate limiter.
//!
//! One instance is created when the server starts and shared by every worker through app data.
use std::{
    collections::{HashMap, VecDeque},
    net::IpAddr,
    sync::Mutex,
    time::{Duration, Instant},
};

use log::*;

pub const ONE_MINUTE: Duration = Duration::from_secs(60);

pub struct RateLimiter {
    limit: usize,
    window: Duration,
    state: Mutex<LimiterState>,
}

struct LimiterState {
    hits: HashMap<IpAddr, VecDeque<Instant>>,
    last_sweep: Instant,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RateLimiter ({} per {:?})", self.limit, self.window)
    }
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        let state = LimiterState { hits: HashMap::new(), last_sweep: Instant::now() };
        Self { limit: limit as usize, window, state: Mutex::new(state) }
    }

    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, ONE_MINUTE)
    }

    /// Records a request from `client`. Returns the number of seconds the client should wait if it has used up its
    /// allowance for the current window.
    pub fn check(&self, client: IpAddr) -> Result<(), u64> {
        self.check_at(client, Instant::now())
    }

    pub fn check_at(&self, client: IpAddr, now: Instant) -> Result<(), u64> {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if now.saturating_duration_since(state.last_sweep) >= self.window {
            let window = self.window;
            state.hits.retain(|_, hits| hits.back().is_some_and(|t| now.saturating_duration_since(*t) < window));
            state.last_sweep = now;
            trace!("💻️ Rate limiter sweep. {} clients remain", state.hits.len());
        }
        let hits = state.hits.entry(client).or_default();
        while hits.front().is_some_and(|t| now.saturating_duration_since(*t) >= self.window) {
            hits.pop_front();
        }
        if hits.len() >= self.limit {
            debug!("💻️ Client {client} is rate limited");
            return Err(self.window.as_secs());
        }
        hits.push_back(now);
        Ok(())
    }

    /// The number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.state.lock().map(|s| s.hits.len()).unwrap_or_else(|poisoned| poisoned.into_inner().hits.len())
    }
}
