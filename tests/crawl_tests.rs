//! Integration tests for the crawl controller
//!
//! These tests use wiremock to create mock HTTP servers and exercise the
//! full crawl cycle end-to-end: deduplication, callback ordering, redirect
//! chains, and cancellation.

use siterake::crawler::{Crawler, CrawlerConfig, Fetcher, HttpFetcher, LinkRejected, Page, Redirect};
use siterake::url::PageUrl;
use siterake::SiterakeError;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn internal_only(base: &PageUrl) -> siterake::crawler::OnNewLink {
    let base = base.clone();
    Arc::new(move |_page: &Page, link: &siterake::crawler::Link| {
        if link.url.is_internal(&base) {
            Ok(())
        } else {
            Err(LinkRejected::External)
        }
    })
}

fn collect_paths(visited: &Arc<Mutex<Vec<String>>>) -> siterake::crawler::OnPage {
    let visited = Arc::clone(visited);
    Arc::new(move |page: &Page| {
        if let Ok(mut visited) = visited.lock() {
            visited.push(page.url.path().to_string());
        }
    })
}

fn crawler_for(
    base: &PageUrl,
    workers: usize,
    visited: &Arc<Mutex<Vec<String>>>,
) -> Crawler {
    Crawler::new(CrawlerConfig {
        base_url: base.clone(),
        worker_count: workers,
        entrypoints: vec!["/".to_string()],
        fetcher: Arc::new(HttpFetcher::new(None).expect("fetcher")),
        on_new_link: internal_only(base),
        on_page: collect_paths(visited),
        on_fetch_error: None,
    })
}

#[tokio::test]
async fn test_deduplicates_fragments() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r##"<html><body>
            <a href="/page">Page</a>
            <a href="/page#section1">Section 1</a>
            <a href="/page#section2">Section 2</a>
            <a href="/page#section3">Section 3</a>
        </body></html>"##
            .to_string(),
    )
    .await;
    mount_page(&server, "/page", "<html><body><h1>The Page</h1></body></html>".to_string()).await;

    let base = PageUrl::parse(&server.uri()).expect("base url");
    let visited = Arc::new(Mutex::new(Vec::new()));

    crawler_for(&base, 1, &visited)
        .run(CancellationToken::new())
        .await
        .expect("crawl");

    let visited = visited.lock().unwrap();
    assert_eq!(
        visited.len(),
        2,
        "should only visit 2 unique pages, got {:?}",
        *visited
    );
    assert_eq!(visited.iter().filter(|p| p.as_str() == "/page").count(), 1);
}

#[tokio::test]
async fn test_deduplicates_scheme_variants() {
    let server = MockServer::start().await;
    let authority = PageUrl::parse(&server.uri()).unwrap().authority();
    mount_page(
        &server,
        "/",
        format!(
            r#"<html><body>
                <a href="/about">About (relative)</a>
                <a href="http://{0}/about">About (http)</a>
                <a href="https://{0}/about">About (https)</a>
            </body></html>"#,
            authority
        ),
    )
    .await;
    mount_page(&server, "/about", "<html><body><h1>About</h1></body></html>".to_string()).await;

    let base = PageUrl::parse(&server.uri()).expect("base url");
    let visited = Arc::new(Mutex::new(Vec::new()));

    crawler_for(&base, 1, &visited)
        .run(CancellationToken::new())
        .await
        .expect("crawl");

    let visited = visited.lock().unwrap();
    assert_eq!(visited.len(), 2, "expected only / and /about, got {:?}", *visited);
    assert_eq!(visited.iter().filter(|p| p.as_str() == "/about").count(), 1);
}

#[tokio::test]
async fn test_deduplicates_trailing_slash() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><body>
            <a href="/about">One</a>
            <a href="/about/">Two</a>
        </body></html>"#
            .to_string(),
    )
    .await;
    mount_page(&server, "/about", "<html><body>About</body></html>".to_string()).await;
    mount_page(&server, "/about/", "<html><body>About</body></html>".to_string()).await;

    let base = PageUrl::parse(&server.uri()).expect("base url");
    let visited = Arc::new(Mutex::new(Vec::new()));

    crawler_for(&base, 1, &visited)
        .run(CancellationToken::new())
        .await
        .expect("crawl");

    assert_eq!(visited.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_on_page_at_most_once_with_many_workers() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><body><a href="/a">a</a><a href="/b">b</a></body></html>"#.to_string(),
    )
    .await;
    mount_page(
        &server,
        "/a",
        r#"<html><body><a href="/b">b</a><a href="/c">c</a></body></html>"#.to_string(),
    )
    .await;
    mount_page(
        &server,
        "/b",
        r#"<html><body><a href="/a">a</a><a href="/c">c</a></body></html>"#.to_string(),
    )
    .await;
    mount_page(
        &server,
        "/c",
        r#"<html><body><a href="/a">a</a><a href="/b">b</a></body></html>"#.to_string(),
    )
    .await;

    let base = PageUrl::parse(&server.uri()).expect("base url");
    let visited = Arc::new(Mutex::new(Vec::new()));

    crawler_for(&base, 4, &visited)
        .run(CancellationToken::new())
        .await
        .expect("crawl");

    let mut visited = visited.lock().unwrap().clone();
    visited.sort();
    assert_eq!(visited, vec!["/", "/a", "/b", "/c"]);
}

#[tokio::test]
async fn test_redirect_chain_reported() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><body><a href="/old">Old</a></body></html>"#.to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&server)
        .await;
    mount_page(&server, "/new", "<html><body>Moved here</body></html>".to_string()).await;

    let base = PageUrl::parse(&server.uri()).expect("base url");
    let chains: Arc<Mutex<Vec<(String, u16, Vec<Redirect>)>>> = Arc::new(Mutex::new(Vec::new()));

    let on_page = {
        let chains = Arc::clone(&chains);
        Arc::new(move |page: &Page| {
            if let Ok(mut chains) = chains.lock() {
                chains.push((page.url.path().to_string(), page.status, page.redirect_chain.clone()));
            }
        })
    };

    Crawler::new(CrawlerConfig {
        base_url: base.clone(),
        worker_count: 1,
        entrypoints: vec!["/".to_string()],
        fetcher: Arc::new(HttpFetcher::new(None).expect("fetcher")),
        on_new_link: internal_only(&base),
        on_page,
        on_fetch_error: None,
    })
    .run(CancellationToken::new())
    .await
    .expect("crawl");

    let chains = chains.lock().unwrap();
    let old = chains.iter().find(|(p, _, _)| p == "/old").expect("/old crawled");
    assert_eq!(old.1, 200, "final status after following the redirect");
    assert_eq!(old.2.len(), 1);
    assert_eq!(old.2[0].status, 301);
    assert!(old.2[0].url.ends_with("/old"));
}

#[tokio::test]
async fn test_failed_page_does_not_abort_crawl() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><body><a href="/missing">Missing</a><a href="/ok">Ok</a></body></html>"#
            .to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_page(&server, "/ok", "<html><body>fine</body></html>".to_string()).await;

    let base = PageUrl::parse(&server.uri()).expect("base url");
    let visited = Arc::new(Mutex::new(Vec::new()));

    crawler_for(&base, 2, &visited)
        .run(CancellationToken::new())
        .await
        .expect("crawl");

    // A 404 is still a fetched page (fetch succeeded, status recorded).
    let mut visited = visited.lock().unwrap().clone();
    visited.sort();
    assert_eq!(visited, vec!["/", "/missing", "/ok"]);
}

#[tokio::test]
async fn test_redirect_cap_returns_last_response() {
    let server = MockServer::start().await;
    for hop in 0..12 {
        Mock::given(method("GET"))
            .and(path(format!("/hop{}", hop)))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", format!("/hop{}", hop + 1)),
            )
            .mount(&server)
            .await;
    }

    let fetcher = HttpFetcher::new(None).expect("fetcher");
    let url = PageUrl::parse(&format!("{}/hop0", server.uri())).expect("url");
    let result = fetcher
        .fetch(&CancellationToken::new(), &url)
        .await
        .expect("fetch");

    // Ten hops are followed; the eleventh redirect response is returned
    // as-is instead of being chased further.
    assert_eq!(result.status, 302);
    assert_eq!(result.redirect_chain.len(), 10);
    assert!(result.redirect_chain[0].url.ends_with("/hop0"));
    assert!(result.redirect_chain[9].url.ends_with("/hop9"));
}

#[tokio::test]
async fn test_retry_recovers_from_transient_server_errors() {
    let server = MockServer::start().await;
    // Two 500s, then success.
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>ok</body></html>"))
        .mount(&server)
        .await;

    let policy = siterake::crawler::RetryPolicy {
        max_retries: 3,
        base_delay: Duration::from_millis(10),
    };
    let fetcher = HttpFetcher::with_retry(None, policy).expect("fetcher");
    let url = PageUrl::parse(&format!("{}/flaky", server.uri())).expect("url");

    let result = fetcher
        .fetch(&CancellationToken::new(), &url)
        .await
        .expect("fetch");
    assert_eq!(result.status, 200);
}

#[tokio::test]
async fn test_pre_cancelled_run_fetches_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let base = PageUrl::parse(&server.uri()).expect("base url");
    let visited = Arc::new(Mutex::new(Vec::new()));

    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = crawler_for(&base, 2, &visited).run(cancel).await;
    assert!(matches!(result, Err(SiterakeError::Cancelled)));
    assert!(visited.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_cancellation_mid_crawl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body>slow</body></html>")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let base = PageUrl::parse(&server.uri()).expect("base url");
    let visited = Arc::new(Mutex::new(Vec::new()));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let start = std::time::Instant::now();
    let result = crawler_for(&base, 2, &visited).run(cancel).await;

    assert!(matches!(result, Err(SiterakeError::Cancelled)));
    assert!(
        start.elapsed() < Duration::from_secs(4),
        "cancellation should abort the in-flight fetch promptly"
    );
}
