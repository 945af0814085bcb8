use super::{RateLimitBackend, RateLimitDecision, RateLimitError, RateLimitPolicy};
use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use redis::Script;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Trim, count, and conditionally record one hit in a single round trip.
///
/// KEYS[1] = sorted set of hit timestamps (ms)
/// ARGV = now_ms, window_ms, limit, member
/// Returns {allowed (0|1), count after this call, ms until a slot frees up}
const SLIDING_WINDOW: &str = r#"
local key = KEYS[1]
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])

redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)
local count = redis.call('ZCARD', key)

if count >= limit then
  local reset = window
  local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
  if oldest[2] then
    reset = tonumber(oldest[2]) + window - now
  end
  return {0, count, reset}
end

redis.call('ZADD', key, now, ARGV[4])
redis.call('PEXPIRE', key, window)
return {1, count + 1, window}
"#;

/// Configuration for the Redis rate limit backend.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g. `redis://127.0.0.1:6379`).
    pub url: String,

    /// Key prefix applied to every Redis key to avoid collisions.
    pub prefix: String,

    /// Number of connections in the `deadpool-redis` pool.
    pub pool_size: usize,

    /// Upper bound for acquiring a connection and for running the script.
    pub timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: String::from("redis://127.0.0.1:6379"),
            prefix: String::from("portal"),
            pool_size: 8,
            timeout: Duration::from_millis(250),
        }
    }
}

/// Sliding-window limiter shared by every instance through Redis.
pub struct RedisSlidingWindow {
    pool: Pool,
    prefix: String,
    timeout: Duration,
    script: Script,
}

impl RedisSlidingWindow {
    /// Create the backend. No connection is opened until the first hit.
    pub fn new(config: &RedisConfig) -> Result<Self, RateLimitError> {
        let cfg = Config::from_url(&config.url);
        let pool = cfg
            .builder()
            .map(|b| {
                b.max_size(config.pool_size)
                    .wait_timeout(Some(config.timeout))
                    .create_timeout(Some(config.timeout))
                    .runtime(Runtime::Tokio1)
                    .build()
            })
            .map_err(|e| RateLimitError::Connection(e.to_string()))?
            .map_err(|e| RateLimitError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            prefix: config.prefix.clone(),
            timeout: config.timeout,
            script: Script::new(SLIDING_WINDOW),
        })
    }

    fn redis_key(&self, key: &str) -> String {
        format!("{}:rl:{}", self.prefix, key)
    }

    async fn run(
        &self,
        redis_key: &str,
        policy: &RateLimitPolicy,
    ) -> Result<Vec<i64>, RateLimitError> {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| RateLimitError::Backend(e.to_string()))?
            .as_millis() as i64;
        let window_ms = i64::try_from(policy.window.as_millis()).unwrap_or(i64::MAX);
        let member = format!("{}-{}", now_ms, Uuid::new_v4().simple());

        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| RateLimitError::Connection(e.to_string()))?;

        self.script
            .key(redis_key)
            .arg(now_ms)
            .arg(window_ms)
            .arg(policy.max_requests)
            .arg(member)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| RateLimitError::Backend(e.to_string()))
    }
}

#[async_trait]
impl RateLimitBackend for RedisSlidingWindow {
    async fn hit(
        &self,
        key: &str,
        policy: &RateLimitPolicy,
    ) -> Result<RateLimitDecision, RateLimitError> {
        let redis_key = self.redis_key(key);
        let reply = tokio::time::timeout(self.timeout, self.run(&redis_key, policy))
            .await
            .map_err(|_| RateLimitError::Timeout(self.timeout))??;

        decision_from_reply(&reply, policy)
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

fn decision_from_reply(
    reply: &[i64],
    policy: &RateLimitPolicy,
) -> Result<RateLimitDecision, RateLimitError> {
    let [allowed, count, reset_ms] = reply else {
        return Err(RateLimitError::Backend(format!(
            "unexpected script reply: {:?}",
            reply
        )));
    };
    let limit = policy.max_requests;
    let count = u32::try_from(*count).unwrap_or(u32::MAX);

    Ok(RateLimitDecision {
        allowed: *allowed == 1,
        remaining: limit.saturating_sub(count),
        limit,
        reset_after: Duration::from_millis((*reset_ms).max(0) as u64),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let cfg = RedisConfig::default();
        assert_eq!(cfg.url, "redis://127.0.0.1:6379");
        assert_eq!(cfg.prefix, "portal");
        assert_eq!(cfg.pool_size, 8);
        assert_eq!(cfg.timeout, Duration::from_millis(250));
    }

    #[test]
    fn keys_are_prefixed() {
        let backend = RedisSlidingWindow::new(&RedisConfig::default()).unwrap();
        assert_eq!(
            backend.redis_key("submit:ip:abcd"),
            "portal:rl:submit:ip:abcd"
        );
    }

    #[test]
    fn reply_maps_to_decision() {
        let policy = RateLimitPolicy::new(10, Duration::from_secs(60));

        let allowed = decision_from_reply(&[1, 4, 60_000], &policy).unwrap();
        assert!(allowed.allowed);
        assert_eq!(allowed.remaining, 6);
        assert_eq!(allowed.reset_after, Duration::from_secs(60));

        let denied = decision_from_reply(&[0, 10, 1_500], &policy).unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
        assert_eq!(denied.retry_after_secs(), 2);

        assert!(decision_from_reply(&[1, 2], &policy).is_err());
    }

    #[tokio::test]
    async fn unreachable_server_is_an_error() {
        let backend = RedisSlidingWindow::new(&RedisConfig {
            url: "redis://127.0.0.1:1".to_string(),
            timeout: Duration::from_millis(200),
            ..RedisConfig::default()
        })
        .unwrap();

        let policy = RateLimitPolicy::default();
        assert!(backend.hit("k", &policy).await.is_err());
    }
}
