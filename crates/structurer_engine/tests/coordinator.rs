use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use structurer_engine::{
    ArticleError, ArticleSource, Coordinator, EngineConfig, ExtractedDocument, ExtractionMethod,
    ExtractionStage, Fetcher, LibraryArticle, ReqwestFetcher, StageOutcome, StructuralToken,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Fetches the page once, like a real article library would, then reports a
/// fixed body text.
struct FetchingSource {
    fetcher: ReqwestFetcher,
    body_text: String,
    content_html: Option<String>,
}

#[async_trait::async_trait]
impl ArticleSource for FetchingSource {
    async fn extract(&self, url: &str) -> Result<LibraryArticle, ArticleError> {
        self.fetcher.fetch(url).await?;
        Ok(LibraryArticle {
            title: "Library title".to_string(),
            body_text: self.body_text.clone(),
            content_html: self.content_html.clone(),
            authors: vec!["Ann Lee".to_string()],
            publish_date: None,
        })
    }
}

struct FailingSource;

#[async_trait::async_trait]
impl ArticleSource for FailingSource {
    async fn extract(&self, _url: &str) -> Result<LibraryArticle, ArticleError> {
        Err(ArticleError::Readability("no article found".to_string()))
    }
}

struct SlowSource;

#[async_trait::async_trait]
impl ArticleSource for SlowSource {
    async fn extract(&self, _url: &str) -> Result<LibraryArticle, ArticleError> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Err(ArticleError::Readability("unreachable".to_string()))
    }
}

struct CountingStage {
    calls: Arc<AtomicUsize>,
    result: Option<&'static str>,
}

#[async_trait::async_trait]
impl ExtractionStage for CountingStage {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn attempt(&self, url: &str) -> StageOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.result {
            Some(text) => StageOutcome::Extracted(ExtractedDocument {
                url: url.to_string(),
                title: String::new(),
                tokens: vec![StructuralToken::Paragraph {
                    text: text.to_string(),
                }],
                method: ExtractionMethod::GenericFallback,
                authors: None,
                publish_date: None,
            }),
            None => StageOutcome::Continue("nothing here".to_string()),
        }
    }
}

fn coordinator(config: &EngineConfig, source: impl ArticleSource + 'static) -> Coordinator {
    structurer_logging::initialize_for_tests();
    let fetcher: Arc<dyn Fetcher> = Arc::new(ReqwestFetcher::new(config.fetch.clone()));
    Coordinator::with_collaborators(config, fetcher, Arc::new(source)).unwrap()
}

async fn serve_page(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html; charset=utf-8"))
        .mount(server)
        .await;
}

fn recipe_page(story: &str) -> String {
    format!(
        "<html><head><title> Weeknight Pancakes </title><script>track()</script></head>\
         <body><nav><p>Home | Recipes | About | Contact | Subscribe</p></nav>\
         <article><h1>Pancakes</h1><p>{story}</p></article>\
         <footer><p>Copyright and other footer material here</p></footer></body></html>"
    )
}

#[tokio::test]
async fn library_success_skips_the_fallback_fetch() {
    let server = MockServer::start().await;
    serve_page(&server, "/post", recipe_page(&"w".repeat(300))).await;

    let config = EngineConfig::default();
    let source = FetchingSource {
        fetcher: ReqwestFetcher::new(config.fetch.clone()),
        body_text: "l".repeat(250),
        content_html: None,
    };
    let coordinator = coordinator(&config, source);

    let doc = coordinator
        .extract(&format!("{}/post", server.uri()))
        .await
        .unwrap();

    assert_eq!(doc.method, ExtractionMethod::LibraryExtraction);
    assert_eq!(doc.title, "Library title");
    assert_eq!(doc.authors, Some(vec!["Ann Lee".to_string()]));
    assert_eq!(doc.render(), "l".repeat(250));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn short_library_text_falls_back() {
    let server = MockServer::start().await;
    let story = "s".repeat(260);
    serve_page(&server, "/post", recipe_page(&story)).await;

    let config = EngineConfig::default();
    let source = FetchingSource {
        fetcher: ReqwestFetcher::new(config.fetch.clone()),
        body_text: "l".repeat(200),
        content_html: None,
    };

    let doc = coordinator(&config, source)
        .extract(&format!("{}/post", server.uri()))
        .await
        .unwrap();

    assert_eq!(doc.method, ExtractionMethod::GenericFallback);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn thin_library_markup_falls_back_despite_long_text() {
    let server = MockServer::start().await;
    let story = "s".repeat(260);
    serve_page(&server, "/post", recipe_page(&story)).await;

    let config = EngineConfig::default();
    let source = FetchingSource {
        fetcher: ReqwestFetcher::new(config.fetch.clone()),
        body_text: "l".repeat(250),
        content_html: Some("<h2>Comments</h2><p>Share this recipe with friends</p>".to_string()),
    };

    let doc = coordinator(&config, source)
        .extract(&format!("{}/post", server.uri()))
        .await
        .unwrap();

    assert_eq!(doc.method, ExtractionMethod::GenericFallback);
    assert!(doc.render().contains(&story));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn library_failure_falls_back_to_the_page() {
    let server = MockServer::start().await;
    let story = "s".repeat(260);
    serve_page(&server, "/post", recipe_page(&story)).await;

    let doc = coordinator(&EngineConfig::default(), FailingSource)
        .extract(&format!("{}/post", server.uri()))
        .await
        .unwrap();

    assert_eq!(doc.method, ExtractionMethod::GenericFallback);
    assert_eq!(doc.title, "Weeknight Pancakes");
    assert_eq!(doc.authors, None);
    assert_eq!(
        doc.tokens,
        vec![
            StructuralToken::Heading {
                level: 1,
                text: "Pancakes".to_string()
            },
            StructuralToken::Paragraph { text: story },
        ]
    );
}

#[tokio::test]
async fn missing_title_uses_the_placeholder() {
    let server = MockServer::start().await;
    let html = format!("<html><body><main><p>{}</p></main></body></html>", "m".repeat(230));
    serve_page(&server, "/untitled", html).await;

    let doc = coordinator(&EngineConfig::default(), FailingSource)
        .extract(&format!("{}/untitled", server.uri()))
        .await
        .unwrap();

    assert_eq!(doc.title, "Untitled");
}

#[tokio::test]
async fn slow_library_times_out_into_the_fallback() {
    let server = MockServer::start().await;
    serve_page(&server, "/post", recipe_page(&"s".repeat(260))).await;

    let config = EngineConfig {
        library_timeout: Duration::from_millis(100),
        ..EngineConfig::default()
    };

    let doc = coordinator(&config, SlowSource)
        .extract(&format!("{}/post", server.uri()))
        .await
        .unwrap();

    assert_eq!(doc.method, ExtractionMethod::GenericFallback);
}

#[tokio::test]
async fn short_page_reports_every_stage() {
    let server = MockServer::start().await;
    serve_page(&server, "/thin", recipe_page("Only a short teaser paragraph.")).await;

    let url = format!("{}/thin", server.uri());
    let err = coordinator(&EngineConfig::default(), FailingSource)
        .extract(&url)
        .await
        .unwrap_err();

    assert_eq!(err.url, url);
    assert_eq!(err.reasons.len(), 2);
    assert_eq!(err.reasons[0], "library: readability failed: no article found");
    assert!(err.reasons[1].starts_with("generic: extracted text too short"));
}

#[tokio::test]
async fn http_errors_are_reported_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let err = coordinator(&EngineConfig::default(), FailingSource)
        .extract(&format!("{}/gone", server.uri()))
        .await
        .unwrap_err();

    assert!(err.reasons[1].contains("http status 410"));
}

#[tokio::test]
async fn invalid_url_never_reaches_a_stage() {
    let calls = Arc::new(AtomicUsize::new(0));
    let coordinator = Coordinator::from_stages(vec![Box::new(CountingStage {
        calls: calls.clone(),
        result: Some("anything"),
    })]);

    let err = coordinator.extract("not a url").await.unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(err.reasons.len(), 1);
    assert!(err.reasons[0].starts_with("invalid url"));
}

#[tokio::test]
async fn stages_run_in_order_until_one_succeeds() {
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    let third = Arc::new(AtomicUsize::new(0));
    let coordinator = Coordinator::from_stages(vec![
        Box::new(CountingStage {
            calls: first.clone(),
            result: None,
        }),
        Box::new(CountingStage {
            calls: second.clone(),
            result: Some("second stage text"),
        }),
        Box::new(CountingStage {
            calls: third.clone(),
            result: Some("never produced"),
        }),
    ]);

    let doc = coordinator.extract("https://example.com/a").await.unwrap();

    assert_eq!(doc.render(), "second stage text");
    assert_eq!(
        [first, second, third].map(|c| c.load(Ordering::SeqCst)),
        [1, 1, 0]
    );
}

#[tokio::test]
async fn readability_pipeline_extracts_a_real_article() {
    let server = MockServer::start().await;
    let paragraphs = [
        "Pancakes are one of the simplest breakfasts to make at home, and with a little care they come out light, fluffy, and golden every single time.",
        "Start by whisking the flour, sugar, baking powder, and salt together in a large bowl, then make a well in the centre for the wet ingredients.",
        "Beat the eggs with the milk and melted butter, pour them into the well, and stir gently until just combined; a few lumps are perfectly fine.",
        "Heat a heavy pan over medium heat, brush it with butter, and ladle in the batter, flipping each pancake once bubbles form across the surface.",
    ];
    let body: String = paragraphs.iter().map(|p| format!("<p>{p}</p>")).collect();
    let html = format!(
        "<html><head><title>Fluffy Pancakes</title></head><body>\
         <nav><a href=\"/\">Home</a></nav>\
         <article><h1>Fluffy Pancakes</h1>{body}</article></body></html>"
    );
    serve_page(&server, "/pancakes", html).await;

    let coordinator = Coordinator::new(&EngineConfig::default()).unwrap();
    let doc = coordinator
        .extract(&format!("{}/pancakes", server.uri()))
        .await
        .unwrap();

    assert_eq!(doc.method, ExtractionMethod::LibraryExtraction);
    assert!(doc.render().contains("Beat the eggs with the milk"));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
