//! Problem Source Client: Codeforces statements behind a local JSON cache.
//!
//! A lookup is served from `cf_cache.json` when the cached entry is complete.
//! Otherwise the rating is resolved from the problemset listing, the problem
//! page is scraped with a bounded retry loop, and the new record is merged
//! into the cache with an atomic rewrite.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};

use reqwest::header::{self, HeaderMap, HeaderValue};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::CoachConfig,
    error::{CoachError, FetchError, Result},
    store,
};

const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Top-level statement blocks that are not part of the legend.
const NON_LEGEND_BLOCKS: &[&str] = &[
    "header",
    "input-specification",
    "output-specification",
    "sample-tests",
    "note",
];

/// A problem identifier such as `116A` split into its contest and index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemKey {
    pub contest_id: String,
    pub index: String,
    normalized: String,
}

impl ProblemKey {
    /// Split digits from letters. No further validation: a malformed key
    /// yields empty parts and simply never resolves.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_uppercase();
        let contest_id = normalized.chars().filter(|c| c.is_ascii_digit()).collect();
        let index = normalized
            .chars()
            .filter(|c| c.is_alphabetic())
            .collect();
        Self {
            contest_id,
            index,
            normalized,
        }
    }

    /// Key of the problem cache document.
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// Stem of the per-problem analysis cache file.
    pub fn slug(&self) -> String {
        self.normalized.to_lowercase()
    }
}

impl std::fmt::Display for ProblemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.normalized)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemRecord {
    pub contest_id: u32,
    pub index: String,
    pub title: String,
    pub rating: Option<u32>,
    pub time_limit: String,
    pub memory_limit: String,
    pub statement: String,
    pub input: String,
    pub output: String,
    pub url: String,
}

impl ProblemRecord {
    /// Every required text field is non-blank, and the rating is present
    /// when ratings are mandatory.
    pub fn is_complete(&self, require_rating: bool) -> bool {
        let texts = [
            &self.title,
            &self.statement,
            &self.input,
            &self.output,
            &self.time_limit,
            &self.memory_limit,
        ];
        texts.iter().all(|t| !t.trim().is_empty()) && (!require_rating || self.rating.is_some())
    }

    /// Contest id and index, e.g. `116A`.
    pub fn code(&self) -> String {
        format!("{}{}", self.contest_id, self.index)
    }

    /// Plain-text rendering sent to the model.
    pub fn prompt_text(&self, key: &ProblemKey) -> String {
        format!(
            "{} \nProblem Title: {} \nProblem Statement: {} \nProblem Inputs: {} \nProblem Outputs: {}",
            key, self.title, self.statement, self.input, self.output
        )
    }
}

/// Raw HTTP answer: the client decides what counts as success.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }
}

#[allow(async_fn_in_trait)]
pub trait HttpFetch {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError>;
}

/// reqwest client dressed up as a desktop Chrome to get past bot challenges.
#[derive(Debug, Clone)]
pub struct BrowserTransport {
    client: reqwest::Client,
}

impl BrowserTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9"),
        );
        headers.insert(
            header::UPGRADE_INSECURE_REQUESTS,
            HeaderValue::from_static("1"),
        );
        headers.insert("sec-ch-ua-platform", HeaderValue::from_static("\"Windows\""));
        headers.insert("sec-ch-ua-mobile", HeaderValue::from_static("?0"));
        headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
        headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));

        let client = reqwest::Client::builder()
            .user_agent(CHROME_USER_AGENT)
            .default_headers(headers)
            .gzip(true)
            .timeout(timeout)
            .build()
            .map_err(|e| CoachError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl HttpFetch for BrowserTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let request_failed = |source| FetchError::Request {
            url: url.to_string(),
            source,
        };
        let res = self.client.get(url).send().await.map_err(request_failed)?;
        let status = res.status().as_u16();
        let body = res.text().await.map_err(request_failed)?;
        Ok(HttpResponse { status, body })
    }
}

#[derive(Debug, Deserialize)]
struct ProblemsetResponse {
    status: String,
    #[serde(default)]
    result: Option<ProblemsetResult>,
}

#[derive(Debug, Deserialize)]
struct ProblemsetResult {
    #[serde(default)]
    problems: Vec<ListedProblem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListedProblem {
    #[serde(default)]
    contest_id: Option<u32>,
    index: String,
    #[serde(default)]
    rating: Option<u32>,
}

/// Fields scraped from a problem page.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScrapedPage {
    pub title: String,
    pub time_limit: String,
    pub memory_limit: String,
    pub statement: String,
    pub input: String,
    pub output: String,
}

pub struct ProblemClient<T> {
    transport: T,
    cache_path: PathBuf,
    base_url: String,
    max_retries: u32,
    retry_backoff: Duration,
    polite_delay: Duration,
    require_rating: bool,
}

impl ProblemClient<BrowserTransport> {
    pub fn from_config(config: &CoachConfig) -> Result<Self> {
        let transport = BrowserTransport::new(config.request_timeout)?;
        Ok(Self::new(transport, config))
    }
}

impl<T: HttpFetch> ProblemClient<T> {
    pub fn new(transport: T, config: &CoachConfig) -> Self {
        Self {
            transport,
            cache_path: config.problem_cache_path(),
            base_url: config.source_base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries.max(1),
            retry_backoff: config.retry_backoff,
            polite_delay: config.polite_delay,
            require_rating: config.require_rating,
        }
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Return the problem, from cache when possible. `Ok(None)` means the
    /// problem could not be retrieved; `Err` is reserved for cache I/O.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch(&self, problem_key: &str) -> Result<Option<ProblemRecord>> {
        let key = ProblemKey::parse(problem_key);

        if let Some(record) = self.cached(&key)? {
            debug!(%key, "problem cache hit");
            return Ok(Some(record));
        }

        let rating = self.fetch_rating(&key).await;
        if rating.is_none() && self.require_rating {
            warn!(%key, "no rating listed for problem, giving up");
            return Ok(None);
        }

        let url = self.problem_url(&key);
        let Some(page) = self.fetch_page(&key, &url).await else {
            return Ok(None);
        };

        let record = ProblemRecord {
            contest_id: key.contest_id.parse().unwrap_or_default(),
            index: key.index.clone(),
            title: page.title,
            rating,
            time_limit: page.time_limit,
            memory_limit: page.memory_limit,
            statement: page.statement,
            input: page.input,
            output: page.output,
            url,
        };
        if !record.is_complete(self.require_rating) {
            warn!(%key, "scraped problem is incomplete, not caching it");
            return Ok(None);
        }

        self.persist(&key, &record)?;
        info!(%key, title = %record.title, "problem cached");
        sleep(self.polite_delay).await;
        Ok(Some(record))
    }

    /// A complete cache entry for `key`, if there is one.
    pub fn cached(&self, key: &ProblemKey) -> Result<Option<ProblemRecord>> {
        let cache = self.load_cache()?;
        let record = cache
            .get(key.as_str())
            .and_then(|entry| serde_json::from_value::<ProblemRecord>(entry.clone()).ok())
            .filter(|record| record.is_complete(self.require_rating));
        if record.is_none() && cache.contains_key(key.as_str()) {
            debug!(%key, "cached problem is incomplete, refetching");
        }
        Ok(record)
    }

    pub fn problem_url(&self, key: &ProblemKey) -> String {
        format!(
            "{}/contest/{}/problem/{}",
            self.base_url, key.contest_id, key.index
        )
    }

    fn load_cache(&self) -> Result<BTreeMap<String, Value>> {
        Ok(store::read_json(&self.cache_path)?.unwrap_or_default())
    }

    fn persist(&self, key: &ProblemKey, record: &ProblemRecord) -> Result<()> {
        let mut cache = self.load_cache()?;
        let entry = serde_json::to_value(record).map_err(|e| CoachError::json(&self.cache_path, e))?;
        cache.insert(key.as_str().to_string(), entry);
        store::write_json_atomic(&self.cache_path, &cache)
    }

    async fn fetch_rating(&self, key: &ProblemKey) -> Option<u32> {
        let url = format!("{}/api/problemset.problems", self.base_url);
        let res = match self.transport.get(&url).await {
            Ok(res) if (200..300).contains(&res.status) => res,
            Ok(res) => {
                warn!(status = res.status, "problemset listing unavailable");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "problemset listing request failed");
                return None;
            }
        };
        lookup_rating(&res.body, key)
    }

    async fn fetch_page(&self, key: &ProblemKey, url: &str) -> Option<ScrapedPage> {
        for attempt in 1..=self.max_retries {
            let outcome = match self.transport.get(url).await {
                Ok(res) if res.status == 200 => parse_problem_page(&res.body),
                Ok(res) => Err(format!("blocked ({})", res.status)),
                Err(e) => Err(e.to_string()),
            };
            match outcome {
                Ok(page) => return Some(page),
                Err(reason) if attempt == self.max_retries => {
                    warn!(%key, attempt, %reason, "problem fetch failed, giving up");
                }
                Err(reason) => {
                    warn!(%key, attempt, %reason, backoff = ?self.retry_backoff, "problem fetch failed, retrying");
                    sleep(self.retry_backoff).await;
                }
            }
        }
        None
    }
}

fn lookup_rating(listing: &str, key: &ProblemKey) -> Option<u32> {
    let parsed: ProblemsetResponse = match serde_json::from_str(listing) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "problemset listing is not valid JSON");
            return None;
        }
    };
    if parsed.status != "OK" {
        warn!(status = %parsed.status, "problemset listing returned an error status");
        return None;
    }
    let contest_id: u32 = key.contest_id.parse().ok()?;
    parsed
        .result?
        .problems
        .into_iter()
        .find(|p| p.contest_id == Some(contest_id) && p.index.eq_ignore_ascii_case(&key.index))
        .and_then(|p| p.rating)
}

pub(crate) fn parse_problem_page(html: &str) -> Result<ScrapedPage, String> {
    let document = Html::parse_document(html);

    let statement = document
        .select(&selector("div.problem-statement"))
        .next()
        .ok_or_else(|| "problem statement not found".to_string())?;
    let title = statement
        .select(&selector("div.title"))
        .next()
        .ok_or_else(|| "problem title not found".to_string())?;

    let first = |css: &str| statement.select(&selector(css)).next();
    let property = |css: &str| {
        first(css)
            .map(|el| text_of(el, &["property-title"], " "))
            .unwrap_or_default()
    };
    let section = |css: &str| {
        first(css)
            .map(|el| text_of(el, &["section-title"], "\n"))
            .unwrap_or_default()
    };

    let legend = statement
        .children()
        .filter_map(ElementRef::wrap)
        .find(|el| {
            el.value().name() == "div"
                && !el.value().classes().any(|c| NON_LEGEND_BLOCKS.contains(&c))
        })
        .map(|el| text_of(el, &[], "\n"))
        .unwrap_or_default();

    Ok(ScrapedPage {
        title: text_of(title, &[], " "),
        time_limit: property("div.time-limit"),
        memory_limit: property("div.memory-limit"),
        statement: legend,
        input: section("div.input-specification"),
        output: section("div.output-specification"),
    })
}

/// Trimmed, non-empty text nodes under `el`, skipping subtrees carrying any
/// of the `skip` classes.
fn text_of(el: ElementRef, skip: &[&str], sep: &str) -> String {
    let mut parts = vec![];
    collect_text(el, skip, &mut parts);
    parts.join(sep)
}

fn collect_text(el: ElementRef, skip: &[&str], parts: &mut Vec<String>) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            let text = text.trim();
            if !text.is_empty() {
                parts.push(text.to_string());
            }
        } else if let Some(child) = ElementRef::wrap(child) {
            if !child.value().classes().any(|c| skip.contains(&c)) {
                collect_text(child, skip, parts);
            }
        }
    }
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}

#[cfg(test)]
mod tests {
    use std::{
        fs,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Mutex,
        },
    };

    use tokio::time::Instant;

    use super::*;
    use crate::config::CoachConfigBuilder;

    const LISTING: &str = r#"{"status":"OK","result":{"problems":[
        {"contestId":116,"index":"A","name":"Tram","type":"PROGRAMMING","rating":800,"tags":["implementation"]},
        {"contestId":116,"index":"B","name":"Little Pigs and Wolves","type":"PROGRAMMING","tags":["greedy"]}
    ],"problemStatistics":[]}}"#;

    fn page() -> String {
        fs::read_to_string("fixtures/cf_116a.html").unwrap()
    }

    #[derive(Debug, Clone, Copy)]
    enum Failure {
        /// 403 from the bot wall.
        Blocked,
        /// 200 with an interstitial instead of the problem.
        Challenge,
        /// No HTTP answer at all.
        Offline,
    }

    /// Serves the listing, then fails the first `failures` page requests.
    struct FakeSource {
        failures: usize,
        failure: Failure,
        page: String,
        page_attempts: Mutex<Vec<Instant>>,
        listing_calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(failures: usize) -> Self {
            Self {
                failures,
                failure: Failure::Blocked,
                page: page(),
                page_attempts: Mutex::new(vec![]),
                listing_calls: AtomicUsize::new(0),
            }
        }

        fn failing_with(mut self, failure: Failure) -> Self {
            self.failure = failure;
            self
        }

        fn serving(mut self, page: String) -> Self {
            self.page = page;
            self
        }

        fn attempts(&self) -> Vec<Instant> {
            self.page_attempts.lock().unwrap().clone()
        }
    }

    impl HttpFetch for FakeSource {
        async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
            if url.ends_with("/api/problemset.problems") {
                self.listing_calls.fetch_add(1, Ordering::SeqCst);
                return Ok(HttpResponse::ok(LISTING));
            }
            let mut attempts = self.page_attempts.lock().unwrap();
            attempts.push(Instant::now());
            if attempts.len() <= self.failures {
                return match self.failure {
                    Failure::Blocked => Ok(HttpResponse {
                        status: 403,
                        body: "Just a moment...".into(),
                    }),
                    Failure::Challenge => Ok(HttpResponse::ok("Just a moment...")),
                    Failure::Offline => Err(FetchError::Unavailable("connection reset".into())),
                };
            }
            Ok(HttpResponse::ok(self.page.clone()))
        }
    }

    fn client(dir: &Path, source: FakeSource) -> ProblemClient<FakeSource> {
        let config = CoachConfigBuilder::default()
            .data_dir(dir)
            .source_base_url("https://cf.test")
            .build()
            .unwrap();
        ProblemClient::new(source, &config)
    }

    fn assert_secs(elapsed: Duration, secs: u64) {
        let expected = Duration::from_secs(secs);
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_millis(50),
            "expected ~{expected:?}, got {elapsed:?}"
        );
    }

    fn complete_record() -> ProblemRecord {
        ProblemRecord {
            contest_id: 116,
            index: "A".into(),
            title: "A. Tram".into(),
            rating: Some(800),
            time_limit: "2 seconds".into(),
            memory_limit: "256 megabytes".into(),
            statement: "Linear Kingdom has exactly one tram line.".into(),
            input: "The first line contains n.".into(),
            output: "Print a single integer.".into(),
            url: "https://cf.test/contest/116/problem/A".into(),
        }
    }

    #[test]
    fn problem_key_should_split_digits_and_letters() {
        let key = ProblemKey::parse(" 1850g ");
        assert_eq!(key.contest_id, "1850");
        assert_eq!(key.index, "G");
        assert_eq!(key.as_str(), "1850G");
        assert_eq!(key.slug(), "1850g");

        let junk = ProblemKey::parse("??");
        assert_eq!(junk.contest_id, "");
        assert_eq!(junk.index, "");
    }

    #[test]
    fn completeness_should_check_every_required_field() {
        let record = complete_record();
        assert!(record.is_complete(true));

        let mut blank = record.clone();
        blank.input = "  ".into();
        assert!(!blank.is_complete(true));

        let mut unrated = record;
        unrated.rating = None;
        assert!(!unrated.is_complete(true));
        assert!(unrated.is_complete(false));
    }

    #[test]
    fn parse_problem_page_should_work() {
        let page = parse_problem_page(&page()).unwrap();
        assert_eq!(page.title, "A. Tram");
        assert_eq!(page.time_limit, "2 seconds");
        assert_eq!(page.memory_limit, "256 megabytes");
        assert!(page.statement.starts_with("Linear Kingdom has exactly one tram line."));
        assert!(!page.statement.contains("time limit per test"));
        assert!(page.input.starts_with("The first line contains a single number n"));
        assert!(!page.input.starts_with("Input"));
        insta::assert_snapshot!(page.output, @"Print a single integer — the minimum possible capacity of the tram (0 is allowed).");
    }

    #[test]
    fn challenge_page_is_rejected() {
        let err = parse_problem_page("<html><body>Just a moment...</body></html>").unwrap_err();
        assert_eq!(err, "problem statement not found");
    }

    #[test]
    fn rating_lookup_should_match_contest_and_index() {
        assert_eq!(lookup_rating(LISTING, &ProblemKey::parse("116a")), Some(800));
        assert_eq!(lookup_rating(LISTING, &ProblemKey::parse("116B")), None);
        assert_eq!(lookup_rating(LISTING, &ProblemKey::parse("117A")), None);
        assert_eq!(
            lookup_rating(r#"{"status":"FAILED","comment":"x"}"#, &ProblemKey::parse("116A")),
            None
        );
    }

    #[tokio::test(start_paused = true)]
    async fn complete_cache_entry_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(dir.path(), FakeSource::new(usize::MAX));
        let cache = BTreeMap::from([("116A".to_string(), complete_record())]);
        store::write_json_atomic(client.cache_path(), &cache).unwrap();

        let record = client.fetch("116a").await.unwrap().unwrap();

        assert_eq!(record, complete_record());
        assert!(client.transport().attempts().is_empty());
        assert_eq!(client.transport().listing_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn incomplete_cache_entry_is_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(dir.path(), FakeSource::new(0));
        let cache = BTreeMap::from([(
            "116A".to_string(),
            serde_json::json!({"title": "A. Tram", "statement": "", "rating": 800}),
        )]);
        store::write_json_atomic(client.cache_path(), &cache).unwrap();

        let record = client.fetch("116A").await.unwrap().unwrap();

        assert_eq!(client.transport().attempts().len(), 1);
        assert!(record.is_complete(true));
        let cached = client.cached(&ProblemKey::parse("116A")).unwrap().unwrap();
        assert_eq!(cached, record);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_retries_then_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(dir.path(), FakeSource::new(2));
        let start = Instant::now();

        let record = client.fetch("116A").await.unwrap().unwrap();

        let attempts = client.transport().attempts();
        assert_eq!(attempts.len(), 3);
        assert_secs(attempts[1] - attempts[0], 5);
        assert_secs(attempts[2] - attempts[1], 5);
        // two backoffs plus the polite delay after caching
        assert_secs(start.elapsed(), 12);

        assert_eq!(record.contest_id, 116);
        assert_eq!(record.index, "A");
        assert_eq!(record.rating, Some(800));
        assert_eq!(record.url, "https://cf.test/contest/116/problem/A");
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_gives_up_after_three_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(dir.path(), FakeSource::new(usize::MAX));
        let start = Instant::now();

        assert!(client.fetch("116A").await.unwrap().is_none());

        assert_eq!(client.transport().attempts().len(), 3);
        assert_secs(start.elapsed(), 10);
        assert!(!client.cache_path().exists());
    }

    #[tokio::test(start_paused = true)]
    async fn challenge_pages_are_retried() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(
            dir.path(),
            FakeSource::new(usize::MAX).failing_with(Failure::Challenge),
        );

        assert!(client.fetch("116A").await.unwrap().is_none());

        let attempts = client.transport().attempts();
        assert_eq!(attempts.len(), 3);
        assert_secs(attempts[2] - attempts[0], 10);
        assert!(!client.cache_path().exists());
    }

    #[tokio::test(start_paused = true)]
    async fn transport_errors_are_retried() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(dir.path(), FakeSource::new(1).failing_with(Failure::Offline));

        let record = client.fetch("116A").await.unwrap().unwrap();

        assert_eq!(client.transport().attempts().len(), 2);
        assert_eq!(record.title, "A. Tram");
    }

    #[tokio::test(start_paused = true)]
    async fn incomplete_page_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let without_output = page().replace("output-specification", "interaction");
        let client = client(dir.path(), FakeSource::new(0).serving(without_output));

        assert!(client.fetch("116A").await.unwrap().is_none());

        assert_eq!(client.transport().attempts().len(), 1);
        assert!(!client.cache_path().exists());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_rating_aborts_before_page_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(dir.path(), FakeSource::new(0));

        assert!(client.fetch("116B").await.unwrap().is_none());
        assert!(client.transport().attempts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_rating_is_tolerated_when_optional() {
        let dir = tempfile::tempdir().unwrap();
        let config = CoachConfigBuilder::default()
            .data_dir(dir.path())
            .source_base_url("https://cf.test/")
            .require_rating(false)
            .build()
            .unwrap();
        let client = ProblemClient::new(FakeSource::new(0), &config);

        let record = client.fetch("116B").await.unwrap().unwrap();
        assert_eq!(record.rating, None);
        assert_eq!(record.url, "https://cf.test/contest/116/problem/B");
    }

    #[tokio::test(start_paused = true)]
    async fn new_entries_are_merged_into_existing_cache() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(dir.path(), FakeSource::new(0));
        let mut other = complete_record();
        other.index = "C".into();
        store::write_json_atomic(
            client.cache_path(),
            &BTreeMap::from([("116C".to_string(), other.clone())]),
        )
        .unwrap();

        client.fetch("116A").await.unwrap().unwrap();

        let cache: BTreeMap<String, ProblemRecord> =
            store::read_json(client.cache_path()).unwrap().unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache["116C"], other);
        assert_eq!(cache["116A"].title, "A. Tram");
    }
}
