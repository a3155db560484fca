use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tokio::sync::RwLock;

use crate::error::ApiError;
use crate::state::AppState;

const WINDOW: Duration = Duration::from_secs(60);

struct WindowCounter {
    window_start: Instant,
    count: u32,
}

/// In-process fixed-window limiter keyed by client IP.
pub struct RateLimiter {
    per_minute: u32,
    windows: RwLock<HashMap<IpAddr, WindowCounter>>,
}

impl RateLimiter {
    pub fn new(per_minute: u32) -> Self {
        Self {
            per_minute,
            windows: RwLock::new(HashMap::new()),
        }
    }

    pub async fn allow(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut windows = self.windows.write().await;
        let counter = windows.entry(ip).or_insert(WindowCounter {
            window_start: now,
            count: 0,
        });

        if now.duration_since(counter.window_start) >= WINDOW {
            counter.window_start = now;
            counter.count = 0;
        }

        counter.count += 1;
        counter.count <= self.per_minute
    }
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if state.limiter.allow(addr.ip()).await {
        Ok(next.run(req).await)
    } else {
        Err(ApiError::RateLimitExceeded)
    }
}
