//! Depth-1 fetch behavior against a mock site.

use httpmock::prelude::*;
use ragserve::config::ServiceConfig;
use ragserve::scrape::PageFetcher;
use ragserve::types::RagError;
use url::Url;

fn fetcher(max_linked_pages: usize) -> PageFetcher {
    let config = ServiceConfig {
        max_linked_pages,
        ..ServiceConfig::default()
    };
    PageFetcher::new(&config).unwrap()
}

fn html_page(body: &str) -> String {
    format!("<html><body>{body}</body></html>")
}

#[tokio::test]
async fn seed_and_same_origin_links_are_fetched_once() {
    let site = MockServer::start_async().await;

    let seed_mock = site
        .mock_async(|when, then| {
            when.method(GET).path("/seed");
            then.status(200)
                .header("content-type", "text/html")
                .body(html_page(
                    "<p>seed</p>\
                     <a href=\"/one\">one</a>\
                     <a href=\"/two\">two</a>\
                     <a href=\"/one\">one again</a>\
                     <a href=\"https://elsewhere.example/foreign\">foreign</a>",
                ));
        })
        .await;
    let one_mock = site
        .mock_async(|when, then| {
            when.method(GET).path("/one");
            then.status(200)
                .header("content-type", "text/html")
                .body(html_page("<p>one</p><a href=\"/deep\">deep</a>"));
        })
        .await;
    let two_mock = site
        .mock_async(|when, then| {
            when.method(GET).path("/two");
            then.status(200)
                .header("content-type", "text/html")
                .body(html_page("<p>two</p>"));
        })
        .await;
    let deep_mock = site
        .mock_async(|when, then| {
            when.method(GET).path("/deep");
            then.status(200)
                .header("content-type", "text/html")
                .body(html_page("<p>deep</p>"));
        })
        .await;

    let seed = Url::parse(&site.url("/seed")).unwrap();
    let pages = fetcher(5).fetch_with_links(&seed).await.unwrap();

    assert_eq!(pages.len(), 3, "seed plus two distinct same-origin links");
    assert_eq!(pages[0].url, seed, "seed page comes first");
    assert!(pages[0].html.contains("seed"));

    seed_mock.assert_hits_async(1).await;
    one_mock.assert_hits_async(1).await;
    two_mock.assert_hits_async(1).await;
    // Depth stops at one: links found on linked pages are never followed.
    deep_mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn linked_page_failures_are_skipped() {
    let site = MockServer::start_async().await;

    site.mock_async(|when, then| {
        when.method(GET).path("/seed");
        then.status(200)
            .header("content-type", "text/html")
            .body(html_page(
                "<p>seed</p>\
                 <a href=\"/ok\">ok</a>\
                 <a href=\"/broken\">broken</a>\
                 <a href=\"/missing\">missing</a>",
            ));
    })
    .await;
    site.mock_async(|when, then| {
        when.method(GET).path("/ok");
        then.status(200)
            .header("content-type", "text/html")
            .body(html_page("<p>ok</p>"));
    })
    .await;
    site.mock_async(|when, then| {
        when.method(GET).path("/broken");
        then.status(500).body("boom");
    })
    .await;

    let seed = Url::parse(&site.url("/seed")).unwrap();
    let pages = fetcher(5).fetch_with_links(&seed).await.unwrap();

    let fetched: Vec<&str> = pages.iter().map(|page| page.url.path()).collect();
    assert_eq!(fetched, vec!["/seed", "/ok"]);
}

#[tokio::test]
async fn non_html_linked_page_is_skipped() {
    let site = MockServer::start_async().await;

    site.mock_async(|when, then| {
        when.method(GET).path("/seed");
        then.status(200)
            .header("content-type", "text/html")
            .body(html_page("<p>seed</p><a href=\"/data\">data</a>"));
    })
    .await;
    site.mock_async(|when, then| {
        when.method(GET).path("/data");
        then.status(200)
            .header("content-type", "application/json")
            .body("{}");
    })
    .await;

    let seed = Url::parse(&site.url("/seed")).unwrap();
    let pages = fetcher(5).fetch_with_links(&seed).await.unwrap();
    assert_eq!(pages.len(), 1);
}

#[tokio::test]
async fn link_cap_limits_followed_pages() {
    let site = MockServer::start_async().await;

    site.mock_async(|when, then| {
        when.method(GET).path("/seed");
        then.status(200)
            .header("content-type", "text/html")
            .body(html_page(
                "<p>seed</p>\
                 <a href=\"/a\">a</a><a href=\"/b\">b</a><a href=\"/c\">c</a>",
            ));
    })
    .await;
    for path in ["/a", "/b", "/c"] {
        site.mock_async(move |when, then| {
            when.method(GET).path(path);
            then.status(200)
                .header("content-type", "text/html")
                .body(html_page("<p>linked</p>"));
        })
        .await;
    }

    let seed = Url::parse(&site.url("/seed")).unwrap();
    let pages = fetcher(2).fetch_with_links(&seed).await.unwrap();
    assert_eq!(pages.len(), 3, "seed plus the first two links only");
}

#[tokio::test]
async fn robots_disallowed_seed_is_fatal() {
    let site = MockServer::start_async().await;

    site.mock_async(|when, then| {
        when.method(GET).path("/robots.txt");
        then.status(200)
            .header("content-type", "text/plain")
            .body("User-agent: *\nDisallow: /\n");
    })
    .await;
    let seed_mock = site
        .mock_async(|when, then| {
            when.method(GET).path("/seed");
            then.status(200)
                .header("content-type", "text/html")
                .body(html_page("<p>seed</p>"));
        })
        .await;

    let seed = Url::parse(&site.url("/seed")).unwrap();
    let err = fetcher(5).fetch_with_links(&seed).await.unwrap_err();
    assert!(matches!(err, RagError::RobotsDisallowed(_)));
    seed_mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn robots_disallowed_linked_page_is_skipped() {
    let site = MockServer::start_async().await;

    site.mock_async(|when, then| {
        when.method(GET).path("/robots.txt");
        then.status(200)
            .header("content-type", "text/plain")
            .body("User-agent: *\nDisallow: /private/\n");
    })
    .await;
    site.mock_async(|when, then| {
        when.method(GET).path("/seed");
        then.status(200)
            .header("content-type", "text/html")
            .body(html_page(
                "<p>seed</p>\
                 <a href=\"/open\">open</a>\
                 <a href=\"/private/page\">private</a>",
            ));
    })
    .await;
    site.mock_async(|when, then| {
        when.method(GET).path("/open");
        then.status(200)
            .header("content-type", "text/html")
            .body(html_page("<p>open</p>"));
    })
    .await;
    let private_mock = site
        .mock_async(|when, then| {
            when.method(GET).path("/private/page");
            then.status(200)
                .header("content-type", "text/html")
                .body(html_page("<p>private</p>"));
        })
        .await;

    let seed = Url::parse(&site.url("/seed")).unwrap();
    let pages = fetcher(5).fetch_with_links(&seed).await.unwrap();

    let fetched: Vec<&str> = pages.iter().map(|page| page.url.path()).collect();
    assert_eq!(fetched, vec!["/seed", "/open"]);
    private_mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn missing_robots_txt_permits_fetching() {
    let site = MockServer::start_async().await;

    site.mock_async(|when, then| {
        when.method(GET).path("/seed");
        then.status(200)
            .header("content-type", "text/html")
            .body(html_page("<p>seed</p>"));
    })
    .await;

    let seed = Url::parse(&site.url("/seed")).unwrap();
    let pages = fetcher(5).fetch_with_links(&seed).await.unwrap();
    assert_eq!(pages.len(), 1);
}

#[tokio::test]
async fn failing_seed_is_fatal() {
    let site = MockServer::start_async().await;
    site.mock_async(|when, then| {
        when.method(GET).path("/seed");
        then.status(404);
    })
    .await;

    let seed = Url::parse(&site.url("/seed")).unwrap();
    let err = fetcher(5).fetch_with_links(&seed).await.unwrap_err();
    assert!(matches!(err, RagError::Fetch(_)));
}

#[tokio::test]
async fn non_html_seed_is_rejected() {
    let site = MockServer::start_async().await;
    site.mock_async(|when, then| {
        when.method(GET).path("/feed");
        then.status(200)
            .header("content-type", "application/json")
            .body("{\"not\": \"html\"}");
    })
    .await;

    let seed = Url::parse(&site.url("/feed")).unwrap();
    let err = fetcher(5).fetch_with_links(&seed).await.unwrap_err();
    assert!(matches!(err, RagError::UnsupportedContentType(_)));
}
