use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::db::{self, RunRow};
use crate::error::QueryError;
use crate::extract::{self, ExtractedRecord};
use crate::fetch::{PageFetcher, SearchFetcher};
use crate::{query, resolver};

/// What happened to one query.
pub struct QueryReport {
    pub query: String,
    pub school_name: Option<String>,
    pub url: Option<String>,
    pub result: Result<ExtractedRecord, QueryError>,
}

impl QueryReport {
    /// True once a search request has been made for this query.
    fn touched_network(&self) -> bool {
        !matches!(self.result, Err(QueryError::InvalidQueryFormat))
    }
}

/// Parse → resolve → extract for a single query.
pub async fn process_query<S, P>(raw: &str, search: &S, pages: &P) -> QueryReport
where
    S: SearchFetcher + ?Sized,
    P: PageFetcher + ?Sized,
{
    let mut report = QueryReport {
        query: raw.to_string(),
        school_name: None,
        url: None,
        result: Err(QueryError::InvalidQueryFormat),
    };

    let Some(school_name) = query::parse(raw) else {
        return report;
    };
    report.school_name = Some(school_name.clone());

    let url = match resolver::resolve(raw, search).await {
        Ok(url) => url,
        Err(e) => {
            report.result = Err(e);
            return report;
        }
    };
    report.url = Some(url.clone());

    report.result = extract::extract(&url, &school_name, pages)
        .await
        .map_err(QueryError::from);
    report
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub records: Vec<ExtractedRecord>,
    pub invalid: usize,
    pub not_found: usize,
    pub failed: usize,
    /// Outcomes that could not be written to the run log.
    pub log_failures: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.records.len() + self.invalid + self.not_found + self.failed
    }
}

/// Process queries one at a time, in order. Neither a failing query nor a
/// failed run-log write stops the batch; both are logged and counted.
pub async fn run_batch<S, P>(
    conn: &Connection,
    batch: &str,
    queries: &[String],
    search: &S,
    pages: &P,
    delay: Duration,
) -> Result<BatchSummary>
where
    S: SearchFetcher + ?Sized,
    P: PageFetcher + ?Sized,
{
    let pb = ProgressBar::new(queries.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let mut summary = BatchSummary::default();

    for (i, raw) in queries.iter().enumerate() {
        info!("Processing: {}", raw);
        let report = process_query(raw, search, pages).await;

        let run = RunRow {
            batch,
            query: &report.query,
            school_name: report.school_name.as_deref(),
            url: report.url.as_deref(),
            outcome: match &report.result {
                Ok(_) => "ok",
                Err(e) => e.kind(),
            },
            error: report.result.as_ref().err().map(|e| e.to_string()),
        };
        if let Err(e) = db::save_run(conn, &run, report.result.as_ref().ok()) {
            warn!("Run log write failed for {}: {:#}", raw, e);
            summary.log_failures += 1;
        }

        let touched_network = report.touched_network();
        match report.result {
            Ok(record) => {
                info!("Extracted {} ({})", record.school_name, record.school_type.tag());
                summary.records.push(record);
            }
            Err(QueryError::InvalidQueryFormat) => {
                warn!("Invalid query format: {}", raw);
                summary.invalid += 1;
            }
            Err(QueryError::LinkNotFound) => {
                warn!("US News link not found: {}", raw);
                summary.not_found += 1;
            }
            Err(e @ QueryError::Fetch(_)) => {
                warn!("Error for {}: {}", raw, e);
                summary.failed += 1;
            }
        }
        pb.inc(1);

        if touched_network && i + 1 < queries.len() && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    pb.finish_and_clear();
    info!(
        "Batch {}: {} queries ({} ok, {} invalid, {} not found, {} errors, {} unlogged)",
        batch,
        summary.total(),
        summary.records.len(),
        summary.invalid,
        summary.not_found,
        summary.failed,
        summary.log_failures
    );
    Ok(summary)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::FetchError;

    const K12_URL: &str = "https://www.usnews.com/education/k12/illinois/lincoln-elementary-school-217356";

    /// Serves canned results keyed by a substring of the query/url and
    /// records every call.
    #[derive(Default)]
    struct Canned {
        search_pages: Vec<(&'static str, String)>,
        profile_pages: Vec<(&'static str, String)>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SearchFetcher for Canned {
        async fn search(&self, query: &str) -> Result<String, FetchError> {
            self.calls.lock().unwrap().push(format!("search:{}", query));
            self.search_pages
                .iter()
                .find(|(key, _)| query.contains(key))
                .map(|(_, html)| html.clone())
                .ok_or(FetchError::Status { url: "search".into(), status: 500 })
        }
    }

    #[async_trait]
    impl PageFetcher for Canned {
        async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
            self.calls.lock().unwrap().push(format!("page:{}", url));
            self.profile_pages
                .iter()
                .find(|(key, _)| url.contains(key))
                .map(|(_, html)| html.clone())
                .ok_or(FetchError::Status { url: url.to_string(), status: 404 })
        }
    }

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap()
    }

    fn canned() -> Canned {
        Canned {
            search_pages: vec![
                ("Lincoln", fixture("search_results")),
                ("Nowhere", r#"<a href="https://example.com/">nothing</a>"#.to_string()),
                (
                    "Gone",
                    r#"<a href="https://www.usnews.com/education/k12/ohio/gone-1">x</a>"#.to_string(),
                ),
            ],
            profile_pages: vec![("lincoln-elementary", fixture("k12_profile"))],
            ..Default::default()
        }
    }

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        conn
    }

    #[tokio::test]
    async fn invalid_query_never_fetches() {
        let fetcher = canned();
        let report = process_query("Lincoln Elementary, Springfield", &fetcher, &fetcher).await;
        assert!(matches!(report.result, Err(QueryError::InvalidQueryFormat)));
        assert!(fetcher.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn full_query_produces_record() {
        let fetcher = canned();
        let report = process_query(
            "US news for Lincoln Elementary School located in Springfield, IL",
            &fetcher,
            &fetcher,
        )
        .await;
        let record = report.result.unwrap();
        assert_eq!(record.school_name, "Lincoln Elementary School");
        assert_eq!(record.ratio, "14:1");
        assert_eq!(report.url.as_deref(), Some(K12_URL));
        assert_eq!(
            *fetcher.calls.lock().unwrap(),
            vec![
                "search:US news for Lincoln Elementary School located in Springfield, IL".to_string(),
                format!("page:{}", K12_URL),
            ]
        );
    }

    #[tokio::test]
    async fn batch_continues_past_failures() {
        let fetcher = canned();
        let conn = memory_db();
        let queries: Vec<String> = [
            "not a lookup",
            "US news for Nowhere High located in Nowhere",
            "US news for Gone Elementary located in Ohio",
            "US news for Lincoln Elementary School located in Springfield, IL",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let summary = run_batch(&conn, "test", &queries, &fetcher, &fetcher, Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(summary.invalid, 1);
        assert_eq!(summary.not_found, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.records.len(), 1);
        assert_eq!(summary.records[0].school_name, "Lincoln Elementary School");
        assert_eq!(summary.total(), 4);

        let stats = db::get_stats(&conn).unwrap();
        assert_eq!(stats.total, 4);
        assert_eq!(stats.ok, 1);
        assert_eq!(stats.fetch_errors, 1);

        let failed_url: Option<String> = conn
            .query_row("SELECT url FROM runs WHERE outcome = 'fetch_error'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(failed_url.as_deref(), Some("https://www.usnews.com/education/k12/ohio/gone-1"));
    }

    fn lookups(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn broken_run_log_keeps_records() {
        let fetcher = canned();
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE runs (id INTEGER PRIMARY KEY, batch TEXT, query TEXT, school_name TEXT,
                                url TEXT, outcome TEXT, error TEXT);
             CREATE TABLE records (run_id INTEGER PRIMARY KEY, payload TEXT);",
        )
        .unwrap();
        let queries = lookups(&[
            "US news for Lincoln Elementary School located in Springfield, IL",
            "US news for Nowhere High located in Nowhere",
            "US news for Lincoln Elementary School located in Springfield, IL",
        ]);

        let summary = run_batch(&conn, "broken", &queries, &fetcher, &fetcher, Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(summary.records.len(), 2);
        assert_eq!(summary.not_found, 1);
        assert_eq!(summary.log_failures, 2);

        // Failed writes roll back; the not-found outcome still lands.
        let logged: usize = conn
            .query_row("SELECT COUNT(*) FROM runs", [], |r| r.get(0))
            .unwrap();
        assert_eq!(logged, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_only_between_network_queries() {
        let fetcher = canned();
        let conn = memory_db();
        let queries = lookups(&[
            "not a lookup",
            "US news for Nowhere High located in Nowhere",
            "US news for Lincoln Elementary School located in Springfield, IL",
        ]);

        let start = tokio::time::Instant::now();
        let summary = run_batch(&conn, "paced", &queries, &fetcher, &fetcher, Duration::from_secs(2))
            .await
            .unwrap();
        let elapsed = start.elapsed();

        assert_eq!(summary.total(), 3);
        // Once after the not-found lookup; never after the invalid one or the last one.
        assert!(elapsed >= Duration::from_secs(2), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(4), "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn delay_after_every_network_query_but_last() {
        let fetcher = canned();
        let conn = memory_db();
        let queries = lookups(&[
            "US news for Lincoln Elementary School located in Springfield, IL",
            "US news for Gone Elementary located in Ohio",
            "US news for Nowhere High located in Nowhere",
        ]);

        let start = tokio::time::Instant::now();
        run_batch(&conn, "paced", &queries, &fetcher, &fetcher, Duration::from_secs(2))
            .await
            .unwrap();
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_secs(4), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(6), "elapsed {:?}", elapsed);
    }
}
