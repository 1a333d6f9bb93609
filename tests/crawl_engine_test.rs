mod common;

use common::{
    BASE_URL, MockAdapter, MockDriver, RecordingReporter, RecordingSink, fresh, hours_ago, job,
    settings,
};
use jobhound::crawl_engine::{CancellationToken, CrawlEngine};
use jobhound::exclusion::ExclusionList;
use jobhound::ipc::RunState;
use jobhound::sites::Extraction;
use tempfile::TempDir;

fn no_exclusions() -> ExclusionList {
    ExclusionList::default()
}

fn page_of(prefix: &str, count: usize) -> Vec<Extraction> {
    (0..count)
        .map(|i| fresh(&format!("{prefix} {i}"), "Initech"))
        .collect()
}

#[tokio::test]
async fn age_limit_on_page_two_completes_without_visiting_page_three() {
    let adapter = MockAdapter::new(vec![
        page_of("p1", 2),
        vec![fresh("p2 0", "Initech"), Extraction::AgeLimit { age_hours: 5 }, fresh("p2 2", "Initech")],
        page_of("p3", 2),
    ]);
    let driver = MockDriver::default();
    let exclusions = no_exclusions();
    let sink = RecordingSink::default();

    let engine = CrawlEngine::new(&adapter, &driver, &exclusions, settings(3), CancellationToken::new());
    let outcome = engine.run(&RecordingReporter::default(), &sink).await;

    assert_eq!(outcome.state, RunState::Completed);
    assert_eq!(outcome.jobs_scraped, 3);
    assert_eq!(outcome.current_page, 2);
    assert_eq!(sink.titles(), ["p1 0", "p1 1", "p2 0"]);
    assert_eq!(driver.visited(), [format!("{BASE_URL}1"), format!("{BASE_URL}2")]);
    assert!(!adapter.extracted().contains(&(2, 2)));
}

#[tokio::test]
async fn old_posting_returned_as_job_still_ends_the_run() {
    let adapter = MockAdapter::new(vec![vec![
        fresh("new", "Initech"),
        Extraction::Job(job("stale", "Initech", &hours_ago(5))),
        fresh("after", "Initech"),
    ]]);
    let driver = MockDriver::default();
    let exclusions = no_exclusions();
    let sink = RecordingSink::default();

    let engine = CrawlEngine::new(&adapter, &driver, &exclusions, settings(3), CancellationToken::new());
    let outcome = engine.run(&RecordingReporter::default(), &sink).await;

    assert_eq!(outcome.state, RunState::Completed);
    assert_eq!(sink.titles(), ["new"]);
    assert_eq!(adapter.extracted(), [(1, 0), (1, 1)]);
}

#[tokio::test]
async fn age_check_precedes_exclusion() {
    let adapter = MockAdapter::new(vec![vec![
        Extraction::Job(job("Sales rep", "Initech", &hours_ago(10))),
        fresh("Developer", "Initech"),
    ]]);
    let driver = MockDriver::default();
    let exclusions = ExclusionList::new(["sales"], Vec::<String>::new());
    let sink = RecordingSink::default();

    let engine = CrawlEngine::new(&adapter, &driver, &exclusions, settings(3), CancellationToken::new());
    let outcome = engine.run(&RecordingReporter::default(), &sink).await;

    assert_eq!(outcome.state, RunState::Completed);
    assert!(sink.jobs().is_empty());
    assert_eq!(adapter.extracted(), [(1, 0)]);
}

#[tokio::test]
async fn empty_first_page_completes_with_zero_jobs() {
    let adapter = MockAdapter::new(vec![Vec::new()]);
    let driver = MockDriver::default();
    let exclusions = no_exclusions();
    let sink = RecordingSink::default();

    let engine = CrawlEngine::new(&adapter, &driver, &exclusions, settings(24), CancellationToken::new());
    let outcome = engine.run(&RecordingReporter::default(), &sink).await;

    assert_eq!(outcome.state, RunState::Completed);
    assert_eq!(outcome.jobs_scraped, 0);
    assert_eq!(outcome.message, "No more job listings found");
    assert!(adapter.extracted().is_empty());
}

#[tokio::test]
async fn stop_flag_between_listings_stops_before_the_next_one() -> std::io::Result<()> {
    let dir = TempDir::new()?;
    let stop_file = dir.path().join("scraper_stop.flag");
    let flag = stop_file.clone();

    let adapter = MockAdapter::new(vec![page_of("job", 10)]).after_extract(move |_, index| {
        if index == 2 {
            std::fs::write(&flag, b"").expect("create stop flag");
        }
    });
    let driver = MockDriver::default();
    let exclusions = no_exclusions();
    let sink = RecordingSink::default();

    let engine = CrawlEngine::new(
        &adapter,
        &driver,
        &exclusions,
        settings(24),
        CancellationToken::watching(&stop_file),
    );
    let outcome = engine.run(&RecordingReporter::default(), &sink).await;

    assert_eq!(outcome.state, RunState::Stopped);
    assert_eq!(outcome.jobs_scraped, 3);
    assert_eq!(outcome.message, "Scraping stopped by user. Jobs scraped: 3");
    assert_eq!(adapter.extracted(), [(1, 0), (1, 1), (1, 2)]);
    Ok(())
}

#[tokio::test]
async fn excluded_company_never_reaches_the_stream() {
    let adapter = MockAdapter::new(vec![vec![
        fresh("Engineer", "Acme Corp"),
        fresh("Engineer", "Globex"),
    ]]);
    let driver = MockDriver::default();
    let exclusions = ExclusionList::new(Vec::<String>::new(), ["acme"]);
    let sink = RecordingSink::default();

    let engine = CrawlEngine::new(&adapter, &driver, &exclusions, settings(24), CancellationToken::new());
    let outcome = engine.run(&RecordingReporter::default(), &sink).await;

    assert_eq!(outcome.state, RunState::Completed);
    assert_eq!(outcome.jobs_scraped, 1);
    let companies: Vec<_> = sink.jobs().into_iter().map(|j| j.company).collect();
    assert_eq!(companies, ["Globex"]);
}

#[tokio::test]
async fn allowed_title_survives_a_matching_keyword() {
    let adapter = MockAdapter::new(vec![vec![
        fresh("אנגלית", "Berlitz"),
        fresh("מורה אנגלית", "Berlitz"),
    ]]);
    let driver = MockDriver::default();
    let exclusions = ExclusionList::new(["אנגלית"], Vec::<String>::new());
    let sink = RecordingSink::default();

    let engine = CrawlEngine::new(&adapter, &driver, &exclusions, settings(24), CancellationToken::new());
    engine.run(&RecordingReporter::default(), &sink).await;

    assert_eq!(sink.titles(), ["אנגלית"]);
}

#[tokio::test]
async fn no_next_page_on_page_four_counts_all_four_pages() {
    let adapter = MockAdapter::new(vec![
        page_of("p1", 3),
        page_of("p2", 2),
        page_of("p3", 4),
        page_of("p4", 1),
    ]);
    let driver = MockDriver::default();
    let exclusions = no_exclusions();
    let sink = RecordingSink::default();
    let reporter = RecordingReporter::default();

    let engine = CrawlEngine::new(&adapter, &driver, &exclusions, settings(24), CancellationToken::new());
    let outcome = engine.run(&reporter, &sink).await;

    assert_eq!(outcome.state, RunState::Completed);
    assert_eq!(outcome.current_page, 4);
    assert_eq!(outcome.jobs_scraped, 10);
    assert_eq!(outcome.message, "No next page. Scraped 10 jobs.");
    assert_eq!(driver.visited().len(), 4);

    let pages: Vec<u32> = reporter.reports().iter().map(|r| r.3).collect();
    assert_eq!(pages, [1, 2, 3, 4]);
    assert!(reporter.reports().iter().all(|r| r.0 == RunState::Running));
    assert_eq!(reporter.reports()[3].2, 9);
}

#[tokio::test]
async fn skips_and_pointer_failures_are_isolated_per_listing() {
    let adapter = MockAdapter::new(vec![vec![
        fresh("first", "Initech"),
        Extraction::Skip,
        fresh("unreachable", "Initech"),
        fresh("last", "Initech"),
    ]])
    .with_pointer_failure(1, 2);
    let driver = MockDriver::default();
    let exclusions = no_exclusions();
    let sink = RecordingSink::default();

    let engine = CrawlEngine::new(&adapter, &driver, &exclusions, settings(24), CancellationToken::new());
    let outcome = engine.run(&RecordingReporter::default(), &sink).await;

    assert_eq!(outcome.state, RunState::Completed);
    assert_eq!(sink.titles(), ["first", "last"]);
    assert_eq!(adapter.extracted(), [(1, 0), (1, 1), (1, 3)]);
}

#[tokio::test]
async fn navigation_failure_is_fatal() {
    let adapter = MockAdapter::new(vec![page_of("p1", 2)]);
    let driver = MockDriver {
        fail_navigation: true,
        ..MockDriver::default()
    };
    let exclusions = no_exclusions();

    let engine = CrawlEngine::new(&adapter, &driver, &exclusions, settings(24), CancellationToken::new());
    let outcome = engine.run(&RecordingReporter::default(), &RecordingSink::default()).await;

    assert_eq!(outcome.state, RunState::Error);
    assert!(outcome.message.starts_with("Error loading page 1"));
}

#[tokio::test(start_paused = true)]
async fn listing_wait_timeout_is_fatal() {
    let adapter = MockAdapter::new(vec![page_of("p1", 2)]);
    let driver = MockDriver {
        never_render: true,
        ..MockDriver::default()
    };
    let exclusions = no_exclusions();

    let engine = CrawlEngine::new(&adapter, &driver, &exclusions, settings(24), CancellationToken::new());
    let outcome = engine.run(&RecordingReporter::default(), &RecordingSink::default()).await;

    assert_eq!(outcome.state, RunState::Error);
    assert_eq!(outcome.message, "Timed out waiting for job listings on page 1");
    assert!(adapter.extracted().is_empty());
}

#[tokio::test]
async fn pagination_error_is_fatal_after_the_page_is_scraped() {
    let adapter = MockAdapter::new(vec![page_of("p1", 2), page_of("p2", 2)]).with_pagination_error_on(1);
    let driver = MockDriver::default();
    let exclusions = no_exclusions();
    let sink = RecordingSink::default();

    let engine = CrawlEngine::new(&adapter, &driver, &exclusions, settings(24), CancellationToken::new());
    let outcome = engine.run(&RecordingReporter::default(), &sink).await;

    assert_eq!(outcome.state, RunState::Error);
    assert_eq!(outcome.jobs_scraped, 2);
    assert!(outcome.message.starts_with("Error with pagination on page 1"));
}

#[tokio::test]
async fn cancelled_token_stops_before_navigation() {
    let adapter = MockAdapter::new(vec![page_of("p1", 2)]);
    let driver = MockDriver::default();
    let exclusions = no_exclusions();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let engine = CrawlEngine::new(&adapter, &driver, &exclusions, settings(24), cancel);
    let outcome = engine.run(&RecordingReporter::default(), &RecordingSink::default()).await;

    assert_eq!(outcome.state, RunState::Stopped);
    assert!(driver.visited().is_empty());
}

#[tokio::test]
async fn every_page_gets_a_human_scroll() {
    let adapter = MockAdapter::new(vec![page_of("p1", 1), page_of("p2", 1)]);
    let driver = MockDriver::default();
    let exclusions = no_exclusions();

    let engine = CrawlEngine::new(&adapter, &driver, &exclusions, settings(24), CancellationToken::new());
    engine.run(&RecordingReporter::default(), &RecordingSink::default()).await;

    // 2 to 5 steps per page
    assert!((4..=10).contains(&driver.scroll_count()));
}
