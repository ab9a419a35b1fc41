use reqwest::{Client, Url};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::de::DeserializeOwned;
use slog::{debug, Logger};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::Error;

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub user_agent: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub cache_ttl: Duration,
    /// api keys that appear in request urls, kept out of logs and errors
    pub secrets: Vec<String>,
}

pub struct RateLimiter {
    capacity: usize,
    tokens: f64,
    last_refill: Instant,
    /// tokens added per second
    refill_rate: f64,
}

impl RateLimiter {
    const MAX_WAITS: usize = 3;
    /// longest single sleep while waiting for the bucket
    const MAX_WAIT: Duration = Duration::from_secs(60);

    pub fn new(capacity: usize, refill_rate: f64) -> Self {
        RateLimiter {
            capacity,
            tokens: capacity as f64,
            last_refill: Instant::now(),
            refill_rate,
        }
    }

    pub fn available(&self) -> f64 {
        self.tokens
    }

    fn refill_tokens(&mut self, now: Instant) {
        let elapsed_time = now.duration_since(self.last_refill).as_secs_f64();
        let tokens_to_add = elapsed_time * self.refill_rate;

        self.tokens = (self.tokens + tokens_to_add).min(self.capacity as f64);
        self.last_refill = now;
    }

    /// Take `tokens` if available right now
    pub fn try_take(&mut self, tokens: f64) -> bool {
        self.refill_tokens(Instant::now());
        if tokens <= self.tokens {
            self.tokens -= tokens;
            true
        } else {
            false
        }
    }

    /// How long until `tokens` will be available at the current refill rate
    fn wait_time(&self, tokens: f64) -> Duration {
        if !(self.refill_rate.is_finite() && self.refill_rate > 0.0) {
            return Duration::from_secs(1);
        }
        let missing = (tokens - self.tokens).max(0.0);
        Duration::try_from_secs_f64(missing / self.refill_rate)
            .map_or(Self::MAX_WAIT, |wait| wait.min(Self::MAX_WAIT))
    }

    /// Take `tokens`, sleeping for the bucket to refill a few times before giving up
    pub async fn acquire(&mut self, tokens: f64) -> bool {
        let mut waits = 0;
        loop {
            if self.try_take(tokens) {
                return true;
            }
            if waits >= Self::MAX_WAITS {
                return false;
            }
            waits += 1;
            sleep(self.wait_time(tokens)).await;
        }
    }
}

/// Response bodies keyed by full request url, dropped after `ttl`
pub struct ResponseCache {
    ttl: Duration,
    entries: HashMap<String, (Instant, String)>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        ResponseCache {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub fn get(&mut self, key: &str) -> Option<String> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&mut self, key: &str, now: Instant) -> Option<String> {
        let (stored_at, body) = self.entries.get(key)?;
        if now.duration_since(*stored_at) < self.ttl {
            return Some(body.clone());
        }
        self.entries.remove(key);
        None
    }

    pub fn insert(&mut self, key: String, body: String) {
        self.insert_at(key, body, Instant::now());
    }

    fn insert_at(&mut self, key: String, body: String, now: Instant) {
        if !self.is_enabled() {
            return;
        }
        let ttl = self.ttl;
        self.entries
            .retain(|_, (stored_at, _)| now.duration_since(*stored_at) < ttl);
        self.entries.insert(key, (now, body));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Replace every secret in `text` with `***`
pub fn redact(text: &str, secrets: &[String]) -> String {
    secrets
        .iter()
        .filter(|secret| !secret.is_empty())
        .fold(text.to_string(), |out, secret| out.replace(secret.as_str(), "***"))
}

/// Join a base url (scheme and host, maybe a prefix) with an endpoint path and query
pub fn build_url(base: &str, path: &str, query: &[(&str, String)]) -> Result<Url, Error> {
    let raw = format!("{}{}", base.trim_end_matches('/'), path);
    let url = if query.is_empty() {
        Url::parse(&raw)
    } else {
        Url::parse_with_params(&raw, query)
    };
    url.map_err(|e| Error::Url(format!("{}: {}", raw, e)))
}

pub struct HttpFetcher {
    logger: Logger,
    client: ClientWithMiddleware,
    timeout: Duration,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    cache: Mutex<ResponseCache>,
    secrets: Vec<String>,
}

impl HttpFetcher {
    pub fn new(
        logger: Logger,
        settings: &FetchSettings,
        rate_limiter: Arc<Mutex<RateLimiter>>,
    ) -> Result<HttpFetcher, Error> {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(settings.max_retries);
        let client = ClientBuilder::new(
            Client::builder()
                .user_agent(&settings.user_agent)
                .build()?,
        )
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build();

        Ok(Self {
            logger,
            client,
            timeout: settings.timeout,
            rate_limiter,
            cache: Mutex::new(ResponseCache::new(settings.cache_ttl)),
            secrets: settings.secrets.clone(),
        })
    }

    pub async fn fetch_text(&self, url: Url) -> Result<String, Error> {
        let key = url.to_string();
        let shown = redact(&key, &self.secrets);
        if let Some(body) = self.cache.lock().await.get(&key) {
            debug!(self.logger, "cache hit: {}", shown);
            return Ok(body);
        }

        {
            let mut limiter = self.rate_limiter.lock().await;
            if !limiter.acquire(1.0).await {
                return Err(Error::RateLimited);
            }
        }

        debug!(self.logger, "requesting: {}", shown);
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|err| match err {
                reqwest_middleware::Error::Reqwest(err) => Error::Http(err.without_url()),
                other => Error::Request(other),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status { url: shown, status });
        }

        let body = response
            .text()
            .await
            .map_err(|err| Error::Http(err.without_url()))?;
        self.cache.lock().await.insert(key, body.clone());
        Ok(body)
    }

    pub async fn fetch_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        let body = self.fetch_text(url).await?;
        Ok(serde_json::from_str(&body)?)
    }
}
