//! Synchronous client for **PokeAPI (v2)**.
//!
//! This module covers the two endpoints the analysis needs: `pokemon/{id}` for a single
//! record and `pokemon/?limit=N` for the ordered listing. Every request goes through the
//! same retry loop with exponential backoff.
//!
//! ### Notes
//! - Fetches are strictly sequential; backoff waits block the calling thread.
//! - A non-2xx status and a transport failure (connect, timeout) are retried. A malformed
//!   URL or an undecodable 2xx body is not.
//! - The HTTP layer sits behind [`Transport`] so the retry logic can be driven without a
//!   network. [`HttpTransport`] is the `reqwest` implementation and keeps one connection
//!   pool for the lifetime of the client.
//!
//! Typical usage:
//! ```no_run
//! # use pokelab::Client;
//! let client = Client::default();
//! let listing = client.list_pokemon(151)?;
//! let batch = client.fetch_all(&["1", "25"]);
//! # Ok::<(), pokelab::FetchError>(())
//! ```
use crate::models::{NamedResource, ResourceList};
use indexmap::IndexMap;
use log::{debug, error, info, warn};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use reqwest::Url;
use reqwest::redirect::Policy;
use serde_json::Value;
use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";

pub type BoxError = Box<dyn StdError + Send + Sync>;

/// A raw HTTP response: status code and body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The single HTTP operation the client needs.
pub trait Transport {
    fn get(&self, url: &Url) -> Result<HttpResponse, BoxError>;
}

/// `reqwest` blocking transport with a reused connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, reqwest::Error> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30)) // total request timeout
            .connect_timeout(Duration::from_secs(10)) // connect timeout
            .redirect(Policy::limited(5)) // cap redirects
            .user_agent(concat!("pokelab/", env!("CARGO_PKG_VERSION"))) // set user agent
            .build()?;
        Ok(Self { http })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &Url) -> Result<HttpResponse, BoxError> {
        let resp = self.http.get(url.clone()).send()?;
        let status = resp.status().as_u16();
        let body = resp.bytes()?.to_vec();
        Ok(HttpResponse { status, body })
    }
}

/// Retry ceiling and backoff unit.
///
/// Attempt `k` (0-indexed) is preceded by a wait of `base_delay * 2^(k-1)` for `k >= 1`,
/// so the first retry waits one unit, the second two. Nothing is awaited after the final
/// attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Wait before attempt `attempt` (0-indexed). Zero for the first attempt.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 1u32 << (attempt - 1).min(16);
        self.base_delay.saturating_mul(factor)
    }
}

/// Why a single attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    Status(u16),
    Transport(String),
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptFailure::Status(s) => write!(f, "HTTP {s}"),
            AttemptFailure::Transport(e) => write!(f, "transport error: {e}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("GET {url}: could not decode response body: {source}")]
    Decode {
        url: String,
        source: serde_json::Error,
    },
    #[error("GET {url}: gave up after {attempts} attempts (last: {last})")]
    Exhausted {
        url: String,
        attempts: u32,
        last: AttemptFailure,
    },
}

/// A decoded payload and the number of retries it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub value: Value,
    pub retries: u32,
}

/// An id whose record could not be fetched.
#[derive(Debug)]
pub struct FailedFetch {
    pub id: String,
    pub error: FetchError,
}

/// Outcome of [`Client::fetch_all`]. Never an error as a whole.
#[derive(Debug, Default)]
pub struct FetchBatch {
    /// Requested id to payload, in request order.
    pub records: IndexMap<String, Value>,
    pub failed: Vec<FailedFetch>,
    /// Number of ids passed in, repeats included.
    pub requested: usize,
    /// Retries spent across the whole batch.
    pub retries: u32,
}

impl FetchBatch {
    pub fn attempted(&self) -> usize {
        self.requested
    }
}

#[derive(Debug, Clone)]
pub struct Client<T = HttpTransport> {
    pub base_url: String,
    pub retry: RetryPolicy,
    transport: T,
}

impl Default for Client {
    fn default() -> Self {
        let transport = HttpTransport::new().expect("reqwest client build");
        Self::with_transport(DEFAULT_BASE_URL, RetryPolicy::default(), transport)
    }
}

impl Client {
    /// HTTP client against `base_url` (e.g. `https://pokeapi.co/api/v2`).
    pub fn new(base_url: impl Into<String>, retry: RetryPolicy) -> Result<Self, reqwest::Error> {
        Ok(Self::with_transport(base_url, retry, HttpTransport::new()?))
    }
}

// Allow -, _, . unescaped in ids (names like "mr-mime" or "farfetch.d")
const SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

impl<T: Transport> Client<T> {
    pub fn with_transport(base_url: impl Into<String>, retry: RetryPolicy, transport: T) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            retry,
            transport,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// URL of a single record.
    pub fn pokemon_url(&self, id: &str) -> String {
        let seg = percent_encoding::utf8_percent_encode(id.trim(), SAFE);
        format!("{}/pokemon/{}", self.base_url, seg)
    }

    /// URL of the listing endpoint.
    pub fn listing_url(&self, limit: u32) -> String {
        format!("{}/pokemon/?limit={}", self.base_url, limit)
    }

    /// GET `url` and decode the JSON body, retrying transient failures.
    pub fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        self.fetch_traced(url).map(|f| f.value)
    }

    /// Like [`Client::fetch`], also reporting how many retries were needed.
    pub fn fetch_traced(&self, url: &str) -> Result<Fetched, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let attempts = self.retry.max_attempts.max(1);
        let mut last = AttemptFailure::Status(0);
        for attempt in 0..attempts {
            let delay = self.retry.delay_before(attempt);
            if !delay.is_zero() {
                info!("retrying {url} in {delay:?} (attempt {}/{attempts})", attempt + 1);
                std::thread::sleep(delay);
            }

            match self.transport.get(&parsed) {
                Ok(r) if r.is_success() => {
                    let value = serde_json::from_slice(&r.body).map_err(|source| {
                        FetchError::Decode {
                            url: url.to_string(),
                            source,
                        }
                    })?;
                    debug!("GET {url} -> {} after {attempt} retries", r.status);
                    return Ok(Fetched {
                        value,
                        retries: attempt,
                    });
                }
                Ok(r) => {
                    warn!("GET {url} failed with HTTP {}", r.status);
                    last = AttemptFailure::Status(r.status);
                }
                Err(e) => {
                    warn!("GET {url} failed: {e}");
                    last = AttemptFailure::Transport(e.to_string());
                }
            }
        }

        error!("GET {url}: max retry threshold ({attempts}) reached");
        Err(FetchError::Exhausted {
            url: url.to_string(),
            attempts,
            last,
        })
    }

    /// Fetch one record by id (numeric or name).
    pub fn fetch_pokemon(&self, id: &str) -> Result<Value, FetchError> {
        self.fetch(&self.pokemon_url(id))
    }

    /// Discover the first `limit` records as ordered `{name, url}` pairs.
    pub fn list_pokemon(&self, limit: u32) -> Result<Vec<NamedResource>, FetchError> {
        let url = self.listing_url(limit);
        let value = self.fetch(&url)?;
        let list: ResourceList =
            serde_json::from_value(value).map_err(|source| FetchError::Decode { url, source })?;
        Ok(list.results)
    }

    /// Fetch every id in order. Failed ids are logged, recorded in
    /// [`FetchBatch::failed`], and left out of [`FetchBatch::records`]. A repeated id
    /// is fetched once.
    pub fn fetch_all<S: AsRef<str>>(&self, ids: &[S]) -> FetchBatch {
        let mut batch = FetchBatch {
            requested: ids.len(),
            ..FetchBatch::default()
        };
        info!("requesting {} records", ids.len());
        for id in ids {
            let id = id.as_ref();
            if batch.records.contains_key(id) || batch.failed.iter().any(|f| f.id == id) {
                debug!("'{id}' requested twice, skipping repeat");
                continue;
            }
            match self.fetch_traced(&self.pokemon_url(id)) {
                Ok(Fetched { value, retries }) => {
                    batch.retries += retries;
                    batch.records.insert(id.to_string(), value);
                }
                Err(error) => {
                    warn!("skipping '{id}': {error}");
                    batch.failed.push(FailedFetch {
                        id: id.to_string(),
                        error,
                    });
                }
            }
        }
        if batch.records.is_empty() && !ids.is_empty() {
            error!("none of the {} requested records could be fetched", ids.len());
        }
        batch
    }
}
