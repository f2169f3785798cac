use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use steamsync_core::{
    AppStats, HistogramEntry, JobCompletion, JobStatus, JobType, PriceUpdate, ReviewSummary,
    StorefrontDetails, SyncCounters, SyncSource,
};
use steamsync_db::{
    AppBase, DbError, DueApp, NewJob, SyncStatusRow, SyncStatusSeed, SyncStore, UpsertCounts,
    VIEW_REFRESH_ORDER,
};
use steamsync_sources::{
    CatalogClient, ClientSettings, CommunityClient, HttpFetcher, RateLimiter, RateLimits,
    RetryOptions, ReviewsClient, SteamClients, SteamSpyClient, StorefrontClient,
};

use super::runner::run_job;
use super::*;

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

fn db_failure() -> DbError {
    DbError::Sqlx(sqlx::Error::PoolTimedOut)
}

#[derive(Debug, Clone)]
struct FakeJob {
    job: NewJob,
    status: JobStatus,
    counters: SyncCounters,
    error_message: Option<String>,
}

#[derive(Default)]
struct FakeState {
    jobs: Vec<FakeJob>,
    known_apps: HashSet<i32>,
    seeded: Vec<(SyncStatusSeed, Option<SyncSource>)>,
    metrics: Vec<(NaiveDate, i32)>,
    storefront: Vec<i32>,
    developers: Vec<String>,
    publishers: Vec<String>,
    developer_links: Vec<(i32, i64)>,
    publisher_links: Vec<(i32, i64)>,
    developer_info: Vec<i32>,
    prices: Vec<PriceUpdate>,
    price_writes: usize,
    histograms: HashMap<i32, Vec<HistogramEntry>>,
    reviews: Vec<ReviewSummary>,
    page_dates: Vec<(i32, Option<NaiveDate>)>,
    successes: Vec<(i32, SyncSource)>,
    errors: Vec<(i32, SyncSource, String)>,
    refreshed: Vec<String>,
}

#[derive(Default)]
struct FakeStore {
    due: Vec<DueApp>,
    fail_due_batch: bool,
    /// `upsert_daily_metrics` fails for any batch containing this app.
    fail_metrics_for: Option<i32>,
    failing_views: Vec<&'static str>,
    state: Mutex<FakeState>,
}

impl FakeStore {
    fn with_due(appids: &[i32]) -> Self {
        Self {
            due: appids
                .iter()
                .map(|&appid| DueApp {
                    appid,
                    priority_score: 10,
                    last_synced_at: None,
                })
                .collect(),
            ..Self::default()
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn only_job(&self) -> FakeJob {
        let state = self.state();
        assert_eq!(state.jobs.len(), 1, "expected exactly one job");
        state.jobs[0].clone()
    }

    fn due_batch(&self, limit: i32) -> Result<Vec<DueApp>, DbError> {
        if self.fail_due_batch {
            return Err(db_failure());
        }
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self.due.iter().take(limit).cloned().collect())
    }

    fn finalize(
        &self,
        id: i64,
        status: JobStatus,
        counters: SyncCounters,
        error_message: Option<String>,
    ) -> Result<(), DbError> {
        let mut state = self.state();
        let index = usize::try_from(id - 1).map_err(|_| DbError::NotFound)?;
        let job = state.jobs.get_mut(index).ok_or(DbError::NotFound)?;
        if job.status != JobStatus::Running {
            return Err(DbError::InvalidJobTransition { id });
        }
        job.status = status;
        job.counters = counters;
        job.error_message = error_message;
        Ok(())
    }
}

fn name_id(names: &mut Vec<String>, name: &str) -> i64 {
    let index = match names.iter().position(|n| n == name) {
        Some(index) => index,
        None => {
            names.push(name.to_string());
            names.len() - 1
        }
    };
    i64::try_from(index).unwrap() + 1
}

#[async_trait]
impl SyncStore for FakeStore {
    async fn create_job(&self, job: &NewJob) -> Result<i64, DbError> {
        let mut state = self.state();
        state.jobs.push(FakeJob {
            job: job.clone(),
            status: JobStatus::Running,
            counters: SyncCounters::default(),
            error_message: None,
        });
        Ok(i64::try_from(state.jobs.len()).unwrap())
    }

    async fn complete_job(&self, id: i64, completion: &JobCompletion) -> Result<(), DbError> {
        self.finalize(
            id,
            completion.status,
            completion.counters,
            completion.error_message.clone(),
        )
    }

    async fn fail_job(&self, id: i64, error_message: &str) -> Result<(), DbError> {
        self.finalize(
            id,
            JobStatus::Failed,
            SyncCounters::default(),
            Some(error_message.to_string()),
        )
    }

    async fn get_apps_for_sync(
        &self,
        _source: SyncSource,
        limit: i32,
    ) -> Result<Vec<DueApp>, DbError> {
        self.due_batch(limit)
    }

    async fn get_apps_for_price_sync(
        &self,
        limit: i32,
        _freshness_hours: i32,
    ) -> Result<Vec<DueApp>, DbError> {
        self.due_batch(limit)
    }

    async fn get_sync_status(&self, _appid: i32) -> Result<Option<SyncStatusRow>, DbError> {
        Ok(None)
    }

    async fn upsert_apps(&self, apps: &[AppBase]) -> Result<UpsertCounts, DbError> {
        let mut state = self.state();
        let mut counts = UpsertCounts::default();
        for app in apps {
            if state.known_apps.insert(app.appid) {
                counts.inserted += 1;
            } else {
                counts.updated += 1;
            }
        }
        Ok(counts)
    }

    async fn upsert_sync_statuses(
        &self,
        seeds: &[SyncStatusSeed],
        synced: Option<SyncSource>,
    ) -> Result<u64, DbError> {
        let mut state = self.state();
        state.seeded.extend(seeds.iter().map(|s| (*s, synced)));
        Ok(seeds.len() as u64)
    }

    async fn upsert_daily_metrics(
        &self,
        metric_date: NaiveDate,
        stats: &[AppStats],
    ) -> Result<u64, DbError> {
        if let Some(bad) = self.fail_metrics_for {
            if stats.iter().any(|s| s.appid == bad) {
                return Err(db_failure());
            }
        }
        let mut state = self.state();
        state.metrics.extend(stats.iter().map(|s| (metric_date, s.appid)));
        Ok(stats.len() as u64)
    }

    async fn update_app_storefront(&self, details: &StorefrontDetails) -> Result<(), DbError> {
        self.state().storefront.push(details.appid);
        Ok(())
    }

    async fn upsert_developer(&self, name: &str) -> Result<i64, DbError> {
        Ok(name_id(&mut self.state().developers, name))
    }

    async fn upsert_publisher(&self, name: &str) -> Result<i64, DbError> {
        Ok(name_id(&mut self.state().publishers, name))
    }

    async fn link_app_developer(&self, appid: i32, developer_id: i64) -> Result<(), DbError> {
        self.state().developer_links.push((appid, developer_id));
        Ok(())
    }

    async fn link_app_publisher(&self, appid: i32, publisher_id: i64) -> Result<(), DbError> {
        self.state().publisher_links.push((appid, publisher_id));
        Ok(())
    }

    async fn mark_app_has_developer_info(&self, appid: i32) -> Result<(), DbError> {
        self.state().developer_info.push(appid);
        Ok(())
    }

    async fn batch_update_prices(&self, prices: &[PriceUpdate]) -> Result<u64, DbError> {
        let mut state = self.state();
        state.price_writes += 1;
        state.prices.extend_from_slice(prices);
        Ok(prices.len() as u64)
    }

    async fn replace_histogram(
        &self,
        appid: i32,
        entries: &[HistogramEntry],
    ) -> Result<u64, DbError> {
        self.state().histograms.insert(appid, entries.to_vec());
        Ok(entries.len() as u64)
    }

    async fn update_review_summary(&self, summary: &ReviewSummary) -> Result<(), DbError> {
        self.state().reviews.push(summary.clone());
        Ok(())
    }

    async fn set_page_creation_date(
        &self,
        appid: i32,
        date: Option<NaiveDate>,
    ) -> Result<(), DbError> {
        self.state().page_dates.push((appid, date));
        Ok(())
    }

    async fn mark_sync_success(&self, appid: i32, source: SyncSource) -> Result<(), DbError> {
        self.state().successes.push((appid, source));
        Ok(())
    }

    async fn mark_sync_error(
        &self,
        appid: i32,
        source: SyncSource,
        message: &str,
    ) -> Result<(), DbError> {
        self.state().errors.push((appid, source, message.to_string()));
        Ok(())
    }

    async fn refresh_materialized_view(&self, name: &str) -> Result<(), DbError> {
        self.state().refreshed.push(name.to_string());
        if self.failing_views.contains(&name) {
            return Err(db_failure());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Client helpers
// ---------------------------------------------------------------------------

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(&ClientSettings {
        timeout_secs: 5,
        user_agent: "steamsync-test/0.1".to_owned(),
        retry: RetryOptions::immediate(0),
    })
    .expect("failed to build test fetcher")
}

fn limiter() -> Arc<RateLimiter> {
    Arc::new(RateLimiter::new("test", 1000.0, 1000))
}

fn storefront_client(server: &MockServer) -> StorefrontClient {
    StorefrontClient::with_base_url(fetcher(), limiter(), &server.uri()).unwrap()
}

fn reviews_client(server: &MockServer) -> ReviewsClient {
    ReviewsClient::with_base_url(fetcher(), limiter(), limiter(), &server.uri()).unwrap()
}

fn new_job(job_type: JobType) -> NewJob {
    NewJob {
        job_type,
        batch_size: Some(10),
        github_run_id: Some("run-42".to_string()),
    }
}

fn error_appids(store: &FakeStore) -> Vec<i32> {
    store.state().errors.iter().map(|(appid, _, _)| *appid).collect()
}

async fn mount_store_app(server: &MockServer, appid: i32, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/appdetails"))
        .and(query_param("appids", appid.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Job lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mixed_batch_completes_with_per_app_failures() {
    let server = MockServer::start().await;
    mount_store_app(
        &server,
        10,
        json!({"10": {"success": true, "data": {
            "type": "game",
            "name": "Alpha",
            "developers": ["Studio A"],
            "publishers": ["Label A"],
            "release_date": {"coming_soon": false, "date": "2020-03-15"}
        }}}),
    )
    .await;
    mount_store_app(&server, 20, json!({"20": {"success": false}})).await;
    Mock::given(method("GET"))
        .and(path("/api/appdetails"))
        .and(query_param("appids", "30"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = FakeStore::with_due(&[10, 20, 30]);
    let client = storefront_client(&server);
    let completion = run_job(
        &store,
        &new_job(JobType::Storefront),
        storefront::sync_storefront(&store, &client, 10),
    )
    .await
    .expect("a run with per-app failures must not fail");

    assert_eq!(completion.status, JobStatus::Completed);
    assert_eq!(completion.counters.processed, 3);
    assert_eq!(completion.counters.succeeded, 1);
    assert_eq!(completion.counters.failed, 2);

    let job = store.only_job();
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.counters, completion.counters);
    assert_eq!(job.job.github_run_id.as_deref(), Some("run-42"));

    let state = store.state();
    assert_eq!(state.successes, vec![(10, SyncSource::Storefront)]);
    assert_eq!(state.storefront, vec![10]);
    assert_eq!(state.developer_links, vec![(10, 1)]);
    assert_eq!(state.publisher_links, vec![(10, 1)]);
    assert_eq!(state.developer_info, vec![10]);
    assert_eq!(state.errors.len(), 2);
    assert_eq!(state.errors[0].0, 20);
    assert!(state.errors[0].2.starts_with("no data"));
    assert_eq!(state.errors[1].0, 30);
}

#[tokio::test]
async fn due_batch_failure_fails_the_job() {
    let server = MockServer::start().await;
    let store = FakeStore {
        fail_due_batch: true,
        ..FakeStore::default()
    };
    let client = storefront_client(&server);

    let err = run_job(
        &store,
        &new_job(JobType::Storefront),
        storefront::sync_storefront(&store, &client, 10),
    )
    .await
    .expect_err("a failed due-batch query must fail the run");
    assert!(format!("{err:#}").contains("failed to select apps due"));

    let job = store.only_job();
    assert_eq!(job.status, JobStatus::Failed);
    assert_eq!(job.counters.processed, 0);
    assert!(job
        .error_message
        .as_deref()
        .is_some_and(|m| m.contains("failed to select apps due")));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_batch_completes_with_zero_counts() {
    let server = MockServer::start().await;
    let store = FakeStore::default();
    let client = reviews_client(&server);

    let completion = run_job(
        &store,
        &new_job(JobType::Reviews),
        reviews::sync_reviews(&store, &client, 10),
    )
    .await
    .unwrap();

    assert_eq!(completion.status, JobStatus::Completed);
    assert_eq!(completion.counters, SyncCounters::default());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn due_batch_respects_batch_size() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/appreviews/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": 2})))
        .expect(1)
        .mount(&server)
        .await;

    let store = FakeStore::with_due(&[1, 2, 3]);
    let client = reviews_client(&server);
    let completion = run_job(
        &store,
        &new_job(JobType::Reviews),
        reviews::sync_reviews(&store, &client, 1),
    )
    .await
    .unwrap();

    assert_eq!(completion.counters.processed, 1);
}

// ---------------------------------------------------------------------------
// Workers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reviews_write_totals_and_count_missing_as_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/appreviews/620"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": 1,
            "query_summary": {
                "review_score": 9,
                "review_score_desc": "Overwhelmingly Positive",
                "total_positive": 980,
                "total_negative": 20,
                "total_reviews": 1000
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/appreviews/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": 1,
            "query_summary": {"total_reviews": 0}
        })))
        .mount(&server)
        .await;

    let store = FakeStore::with_due(&[620, 1]);
    let client = reviews_client(&server);
    let completion = run_job(
        &store,
        &new_job(JobType::Reviews),
        reviews::sync_reviews(&store, &client, 10),
    )
    .await
    .unwrap();

    assert_eq!(completion.counters.succeeded, 1);
    assert_eq!(completion.counters.failed, 1);
    assert_eq!(completion.counters.updated, 1);
    assert_eq!(store.state().reviews[0].total_reviews, 1000);
    assert_eq!(error_appids(&store), vec![1]);
}

#[tokio::test]
async fn prices_are_written_in_bulk_and_unavailable_apps_fail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/appdetails"))
        .and(query_param("filters", "price_overview"))
        .and(query_param("appids", "1,2,3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "1": {"success": true, "data": {"price_overview": {
                "currency": "USD", "initial": 1999, "final": 999, "discount_percent": 50
            }}},
            "2": {"success": true, "data": []},
            "3": {"success": false}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = FakeStore::with_due(&[1, 2, 3]);
    let client = storefront_client(&server);
    let completion = run_job(
        &store,
        &new_job(JobType::Price),
        prices::sync_prices(&store, &client, 100, 24),
    )
    .await
    .unwrap();

    assert_eq!(completion.status, JobStatus::Completed);
    assert_eq!(completion.counters.processed, 3);
    assert_eq!(completion.counters.succeeded, 2);
    assert_eq!(completion.counters.failed, 1);
    assert_eq!(completion.counters.updated, 2);

    let state = store.state();
    assert_eq!(
        state.prices,
        vec![
            PriceUpdate {
                appid: 1,
                price_cents: 999,
                discount_percent: 50
            },
            PriceUpdate {
                appid: 2,
                price_cents: 0,
                discount_percent: 0
            },
        ]
    );
    assert_eq!(state.errors.len(), 1);
    assert_eq!(state.errors[0].0, 3);
    assert_eq!(state.errors[0].1, SyncSource::Price);
}

#[tokio::test]
async fn prices_are_fetched_in_chunks_of_thirty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/appdetails"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(2)
        .mount(&server)
        .await;

    let appids: Vec<i32> = (1..=31).collect();
    let store = FakeStore::with_due(&appids);
    let client = storefront_client(&server);
    let completion = run_job(
        &store,
        &new_job(JobType::Price),
        prices::sync_prices(&store, &client, 1000, 24),
    )
    .await
    .unwrap();

    assert_eq!(completion.counters.processed, 31);
    assert_eq!(completion.counters.failed, 31);
    assert_eq!(store.state().price_writes, 2);
}

#[tokio::test]
async fn histogram_without_history_counts_as_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/appreviewhistogram/620"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": 1,
            "results": {"rollups": [
                {"date": 1_704_067_200, "recommendations_up": 80, "recommendations_down": 20},
                {"date": 1_706_745_600, "recommendations_up": 90, "recommendations_down": 10}
            ]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/appreviewhistogram/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": 1,
            "results": {"rollups": []}
        })))
        .mount(&server)
        .await;

    let store = FakeStore::with_due(&[620, 2]);
    let client = reviews_client(&server);
    let today = NaiveDate::from_ymd_opt(2024, 2, 20).unwrap();
    let completion = run_job(
        &store,
        &new_job(JobType::Histogram),
        histograms::sync_histograms(&store, &client, 10, today),
    )
    .await
    .unwrap();

    assert_eq!(completion.counters.succeeded, 1);
    assert_eq!(completion.counters.failed, 1);
    assert_eq!(completion.counters.created, 0);

    let state = store.state();
    assert_eq!(state.histograms[&620].len(), 2);
    assert!(!state.histograms.contains_key(&2));
    assert_eq!(state.errors.len(), 1);
    assert_eq!(state.errors[0].0, 2);
}

#[tokio::test]
async fn page_dates_split_first_scrapes_from_refreshes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/app/620"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<div>Posted 12 Jun, 2012</div><div>Posted 3 May, 2011</div>"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/app/9"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>quiet hub</html>"))
        .mount(&server)
        .await;

    let store = FakeStore {
        due: vec![
            DueApp {
                appid: 620,
                priority_score: 50,
                last_synced_at: None,
            },
            DueApp {
                appid: 9,
                priority_score: 0,
                last_synced_at: Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()),
            },
        ],
        ..FakeStore::default()
    };
    let client = CommunityClient::with_base_url(fetcher(), limiter(), &server.uri()).unwrap();
    let completion = run_job(
        &store,
        &new_job(JobType::PageCreation),
        page_dates::sync_page_dates(&store, &client, 10),
    )
    .await
    .unwrap();

    assert_eq!(completion.counters.succeeded, 2);
    assert_eq!(completion.counters.created, 1);
    assert_eq!(completion.counters.updated, 1);

    let state = store.state();
    assert_eq!(
        state.page_dates,
        vec![(620, NaiveDate::from_ymd_opt(2011, 5, 3)), (9, None)]
    );
    assert_eq!(
        state.successes,
        vec![(620, SyncSource::PageCreation), (9, SyncSource::PageCreation)]
    );
}

fn spy_app(appid: i32, name: &str) -> serde_json::Value {
    json!({
        "appid": appid,
        "name": name,
        "owners": "20,000 .. 50,000",
        "positive": 100,
        "negative": 10,
        "ccu": 5
    })
}

async fn mount_spy_page(server: &MockServer, page: u32, template: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/api.php"))
        .and(query_param("request", "all"))
        .and(query_param("page", page.to_string()))
        .respond_with(template)
        .mount(server)
        .await;
}

#[tokio::test]
async fn steamspy_page_write_failure_only_fails_that_page() {
    let server = MockServer::start().await;
    mount_spy_page(
        &server,
        0,
        ResponseTemplate::new(200).set_body_json(json!({
            "10": spy_app(10, "Counter-Strike"),
            "20": spy_app(20, "Team Fortress Classic"),
        })),
    )
    .await;
    mount_spy_page(
        &server,
        1,
        ResponseTemplate::new(200).set_body_json(json!({"30": spy_app(30, "Day of Defeat")})),
    )
    .await;
    mount_spy_page(&server, 2, ResponseTemplate::new(200).set_body_string("")).await;

    let store = FakeStore {
        fail_metrics_for: Some(30),
        ..FakeStore::default()
    };
    let client =
        SteamSpyClient::with_base_url(fetcher(), limiter(), limiter(), &server.uri()).unwrap();
    let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
    let completion = run_job(
        &store,
        &new_job(JobType::Steamspy),
        steamspy::sync_steamspy(&store, &client, 100, today),
    )
    .await
    .unwrap();

    assert_eq!(completion.status, JobStatus::Completed);
    assert_eq!(completion.counters.processed, 3);
    assert_eq!(completion.counters.succeeded, 2);
    assert_eq!(completion.counters.failed, 1);
    assert_eq!(completion.counters.created, 2);

    let state = store.state();
    assert_eq!(state.metrics, vec![(today, 10), (today, 20)]);
    assert!(state
        .seeded
        .iter()
        .all(|(_, synced)| *synced == Some(SyncSource::Steamspy)));
}

#[tokio::test]
async fn steamspy_fetch_failure_stops_with_errors() {
    let server = MockServer::start().await;
    mount_spy_page(&server, 0, ResponseTemplate::new(503)).await;

    let store = FakeStore::default();
    let client =
        SteamSpyClient::with_base_url(fetcher(), limiter(), limiter(), &server.uri()).unwrap();
    let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
    let completion = run_job(
        &store,
        &new_job(JobType::Steamspy),
        steamspy::sync_steamspy(&store, &client, 100, today),
    )
    .await
    .unwrap();

    assert_eq!(completion.status, JobStatus::CompletedWithErrors);
    assert_eq!(completion.counters.processed, 0);
    assert!(completion
        .error_message
        .as_deref()
        .is_some_and(|m| m.starts_with("page 0")));
    assert_eq!(store.only_job().status, JobStatus::CompletedWithErrors);
}

#[tokio::test]
async fn steamspy_refreshes_due_apps_missing_from_pages() {
    let server = MockServer::start().await;
    mount_spy_page(&server, 0, ResponseTemplate::new(200).set_body_string("")).await;
    Mock::given(method("GET"))
        .and(path("/api.php"))
        .and(query_param("request", "appdetails"))
        .and(query_param("appid", "440"))
        .respond_with(ResponseTemplate::new(200).set_body_json(spy_app(440, "Team Fortress 2")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api.php"))
        .and(query_param("request", "appdetails"))
        .and(query_param("appid", "123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "appid": 123, "name": null, "owners": "0 .. 20,000"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = FakeStore::with_due(&[440, 123]);
    let client =
        SteamSpyClient::with_base_url(fetcher(), limiter(), limiter(), &server.uri()).unwrap();
    let today = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
    let completion = run_job(
        &store,
        &new_job(JobType::Steamspy),
        steamspy::sync_steamspy(&store, &client, 100, today),
    )
    .await
    .unwrap();

    assert_eq!(completion.status, JobStatus::Completed);
    assert_eq!(completion.counters.processed, 2);
    assert_eq!(completion.counters.succeeded, 1);
    assert_eq!(completion.counters.failed, 1);
    assert_eq!(completion.counters.updated, 1);

    let state = store.state();
    assert_eq!(state.metrics, vec![(today, 440)]);
    assert_eq!(state.successes, vec![(440, SyncSource::Steamspy)]);
    assert_eq!(state.errors.len(), 1);
    assert_eq!(state.errors[0].0, 123);
}

#[tokio::test]
async fn applist_counts_new_and_known_apps() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/IStoreService/GetAppList/v1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {
                "apps": [
                    {"appid": 10, "name": "Counter-Strike"},
                    {"appid": 20, "name": "Team Fortress Classic", "last_modified": 1_700_000_000}
                ],
                "have_more_results": false
            }
        })))
        .mount(&server)
        .await;

    let store = FakeStore::default();
    store.state().known_apps.insert(10);
    let client = CatalogClient::with_base_url(
        fetcher(),
        limiter(),
        Some("test-key".to_owned()),
        &server.uri(),
    )
    .unwrap();
    let completion = run_job(
        &store,
        &new_job(JobType::Applist),
        applist::sync_applist(&store, &client, 10),
    )
    .await
    .unwrap();

    assert_eq!(completion.counters.processed, 2);
    assert_eq!(completion.counters.created, 1);
    assert_eq!(completion.counters.updated, 1);
    let state = store.state();
    assert_eq!(state.seeded.len(), 2);
    assert!(state.seeded.iter().all(|(_, synced)| synced.is_none()));
}

#[tokio::test]
async fn applist_without_api_key_fails_the_job() {
    let server = MockServer::start().await;
    let store = FakeStore::default();
    let client = CatalogClient::with_base_url(fetcher(), limiter(), None, &server.uri()).unwrap();

    let result = run_job(
        &store,
        &new_job(JobType::Applist),
        applist::sync_applist(&store, &client, 10),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(store.only_job().status, JobStatus::Failed);
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

fn default_clients() -> SteamClients {
    SteamClients::new(
        &ClientSettings {
            timeout_secs: 5,
            user_agent: "steamsync-test/0.1".to_owned(),
            retry: RetryOptions::immediate(0),
        },
        &RateLimits::steam_defaults(),
        None,
    )
    .unwrap()
}

#[tokio::test]
async fn failed_view_is_recorded_and_later_tiers_still_refresh() {
    let store = FakeStore {
        failing_views: vec!["developer_metrics"],
        ..FakeStore::default()
    };

    let result = run_worker(
        &store,
        &default_clients(),
        Worker::RefreshViews,
        &RunOptions::default(),
    )
    .await;
    assert!(result.is_err(), "a failed view must exit non-zero");

    let job = store.only_job();
    assert_eq!(job.status, JobStatus::CompletedWithErrors);
    assert_eq!(job.counters.succeeded, 3);
    assert_eq!(job.counters.failed, 1);
    assert!(job
        .error_message
        .as_deref()
        .is_some_and(|m| m.contains("developer_metrics")));

    let expected: Vec<&str> = VIEW_REFRESH_ORDER.iter().map(|v| v.name).collect();
    assert_eq!(store.state().refreshed, expected);
}

#[tokio::test]
async fn all_views_refreshed_exits_cleanly() {
    let store = FakeStore::default();
    let completion = run_worker(
        &store,
        &default_clients(),
        Worker::RefreshViews,
        &RunOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(completion.status, JobStatus::Completed);
    assert_eq!(completion.counters.succeeded, 4);
    assert_eq!(store.only_job().job.batch_size, None);
}

#[test]
fn job_types_match_workers() {
    assert_eq!(Worker::Prices.job_type(), JobType::Price);
    assert_eq!(Worker::PageCreation.job_type(), JobType::PageCreation);
    assert_eq!(Worker::RefreshViews.job_type(), JobType::RefreshViews);
}

#[test]
fn default_batch_sizes() {
    assert_eq!(Worker::Storefront.default_batch_size(), Some(200));
    assert_eq!(Worker::Prices.default_batch_size(), Some(1000));
    assert_eq!(Worker::Reviews.default_batch_size(), Some(200));
    assert_eq!(Worker::Histogram.default_batch_size(), Some(100));
    assert_eq!(Worker::PageCreation.default_batch_size(), Some(50));
    assert_eq!(Worker::Steamspy.default_batch_size(), None);
}

#[test]
fn page_cap_falls_back_for_missing_or_non_positive_values() {
    assert_eq!(page_cap(Some(5), 100), 5);
    assert_eq!(page_cap(Some(0), 100), 100);
    assert_eq!(page_cap(Some(-3), 100), 100);
    assert_eq!(page_cap(None, 100), 100);
}
