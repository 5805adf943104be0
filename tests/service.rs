use {
    bytes::Bytes,
    http::{HeaderValue, Request, Response, StatusCode, header::*},
    http_body_util::{BodyExt, Full},
    serde_json::json,
    std::{
        collections::HashMap,
        convert::Infallible,
        future,
        sync::{
            Arc, Mutex,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    },
    tower::{Layer, Service, ServiceExt, service_fn, util::BoxCloneService},
    tower_http_view_cache::{
        cache::{implementation::moka::*, implementation::*, middleware::*, *},
        *,
    },
};

type TestBody = Full<Bytes>;
type TestService = BoxCloneService<Request<()>, Response<TestBody>, Infallible>;

#[derive(Clone, Default)]
struct Calls(Arc<AtomicUsize>);

impl Calls {
    fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

fn view(
    calls: &Calls,
    status: StatusCode,
    headers: &[(&'static str, &'static str)],
    body: &'static str,
) -> TestService {
    let calls = calls.clone();
    let headers = headers.to_vec();
    BoxCloneService::new(service_fn(move |_request: Request<()>| {
        calls.0.fetch_add(1, Ordering::SeqCst);
        let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
        *response.status_mut() = status;
        for (name, value) in &headers {
            response.headers_mut().insert(*name, HeaderValue::from_static(*value));
        }
        future::ready(Ok::<_, Infallible>(response))
    }))
}

fn moka() -> Caches<MokaCacheImplementation> {
    Caches::single(Arc::new(
        ::moka::future::Cache::<CacheKey, CachedResponseRef>::builder()
            .for_view_cache()
            .build(),
    ))
}

fn settings(timeout: Option<u64>) -> Settings {
    Settings {
        timeout,
        ..Default::default()
    }
}

async fn get<ServiceT>(service: &ServiceT, uri: &str) -> Response<TestBody>
where
    ServiceT: Service<Request<()>, Response = Response<TestBody>, Error = Infallible> + Clone,
{
    service
        .clone()
        .oneshot(Request::get(uri).body(()).unwrap())
        .await
        .unwrap()
}

async fn body(response: Response<TestBody>) -> Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

#[tokio::test]
async fn miss_then_hit() {
    let calls = Calls::default();
    let service = CacheView::new()
        .view_id("articles")
        .layer(&settings(Some(60)), &moka())
        .unwrap()
        .layer(view(&calls, StatusCode::OK, &[("content-type", "application/json")], "[1,2,3]"));

    let miss = get(&service, "/articles").await;
    assert_eq!(miss.status(), StatusCode::OK);
    assert_eq!(miss.headers()[X_CACHE], "MISS");
    assert_eq!(miss.headers()[AGE], "0");
    assert_eq!(miss.headers()[CACHE_CONTROL], "max-age=60");
    assert!(!miss.headers().contains_key(EXPIRES));
    let etag = miss.headers()[ETAG].clone();
    assert_eq!(body(miss).await, "[1,2,3]");

    let hit = get(&service, "/articles").await;
    assert_eq!(hit.status(), StatusCode::OK);
    assert_eq!(hit.headers()[X_CACHE], "HIT");
    assert_eq!(hit.headers()[ETAG], etag);
    assert_eq!(hit.headers()[CONTENT_TYPE], "application/json");
    assert!(hit.headers().contains_key(EXPIRES));

    let age: u64 = hit.headers()[AGE].to_str().unwrap().parse().unwrap();
    assert!((1..=59).contains(&age), "age={}", age);

    assert_eq!(body(hit).await, "[1,2,3]");
    assert_eq!(calls.count(), 1);
}

#[tokio::test]
async fn etag_is_quoted_key() {
    let calls = Calls::default();
    let service = CacheView::new()
        .layer(&settings(Some(60)), &moka())
        .unwrap()
        .layer(view(&calls, StatusCode::OK, &[], "ok"));

    let response = get(&service, "/").await;
    let etag = response.headers()[ETAG].to_str().unwrap();
    assert!(etag.len() > 2 && etag.starts_with('"') && etag.ends_with('"'));
}

#[tokio::test]
async fn error_responses_are_not_stored() {
    let calls = Calls::default();
    let service = CacheView::new()
        .layer(&settings(Some(60)), &moka())
        .unwrap()
        .layer(view(&calls, StatusCode::INTERNAL_SERVER_ERROR, &[], "oops"));

    for _ in 0..2 {
        let response = get(&service, "/").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!response.headers().contains_key(X_CACHE));
    }

    assert_eq!(calls.count(), 2);
}

#[tokio::test]
async fn not_found_is_not_stored() {
    let calls = Calls::default();
    let service = CacheView::new()
        .layer(&settings(Some(60)), &moka())
        .unwrap()
        .layer(view(&calls, StatusCode::NOT_FOUND, &[], ""));

    get(&service, "/missing").await;
    get(&service, "/missing").await;
    assert_eq!(calls.count(), 2);
}

#[tokio::test]
async fn other_methods_pass_through() {
    let calls = Calls::default();
    let service = CacheView::new()
        .layer(&settings(Some(60)), &moka())
        .unwrap()
        .layer(view(&calls, StatusCode::CREATED, &[], "created"));

    for _ in 0..2 {
        let response = service
            .clone()
            .oneshot(Request::post("/").body(()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(!response.headers().contains_key(X_CACHE));
    }

    assert_eq!(calls.count(), 2);
}

#[tokio::test]
async fn view_headers_are_kept() {
    let calls = Calls::default();
    let service = CacheView::new()
        .layer(&settings(Some(60)), &moka())
        .unwrap()
        .layer(view(
            &calls,
            StatusCode::OK,
            &[("x-cache", "BYPASS"), ("cache-control", "private")],
            "ok",
        ));

    let miss = get(&service, "/").await;
    assert_eq!(miss.headers()[X_CACHE], "BYPASS");
    assert_eq!(miss.headers()[CACHE_CONTROL], "private");

    let hit = get(&service, "/").await;
    assert_eq!(hit.headers()[X_CACHE], "BYPASS");
    assert_eq!(hit.headers()[CACHE_CONTROL], "private");
    assert_eq!(calls.count(), 1);
}

#[tokio::test]
async fn query_params_distinguish_entries() {
    let calls = Calls::default();
    let service = CacheView::new()
        .key(QueryParamsKey::new(["page"]).unwrap())
        .layer(&settings(Some(60)), &moka())
        .unwrap()
        .layer(view(&calls, StatusCode::OK, &[], "page"));

    assert_eq!(get(&service, "/?page=1").await.headers()[X_CACHE], "MISS");
    assert_eq!(get(&service, "/?page=2").await.headers()[X_CACHE], "MISS");
    assert_eq!(get(&service, "/?page=1&unrelated=x").await.headers()[X_CACHE], "HIT");
    assert_eq!(calls.count(), 2);
}

#[tokio::test]
async fn same_name_strategies_accumulate() {
    let calls = Calls::default();
    let service = CacheView::new()
        .key(FnKey::new("custom", |context| {
            json!({ "a": context.request.uri.query().unwrap_or_default() })
        }))
        .key(FnKey::new("custom", |context| {
            json!({ "b": context.request.uri.path() })
        }))
        .layer(&settings(Some(60)), &moka())
        .unwrap()
        .layer(view(&calls, StatusCode::OK, &[], "ok"));

    // Both facets contribute, so both the query and the path distinguish entries
    get(&service, "/x?q=1").await;
    get(&service, "/x?q=2").await;
    get(&service, "/y?q=1").await;
    assert_eq!(calls.count(), 3);

    assert_eq!(get(&service, "/y?q=1").await.headers()[X_CACHE], "HIT");
}

#[tokio::test]
async fn key_failure_is_internal_server_error() {
    let calls = Calls::default();
    let service = CacheView::new()
        .key(FnKey::new("broken", |_context| json!(42)))
        .layer(&settings(Some(60)), &moka())
        .unwrap()
        .layer(view(&calls, StatusCode::OK, &[], "ok"));

    let response = get(&service, "/").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let failure = response.extensions().get::<CacheKeyFailure>().unwrap();
    assert!(matches!(&**failure, KeyError::InvalidData { strategy, .. } if strategy == "broken"));
    assert_eq!(calls.count(), 0);
}

#[tokio::test]
async fn never_expiring() {
    let calls = Calls::default();
    let service = CacheView::new()
        .timeout(Timeout::Never)
        .layer(&settings(None), &moka())
        .unwrap()
        .layer(view(&calls, StatusCode::OK, &[], "ok"));

    let miss = get(&service, "/").await;
    assert!(!miss.headers().contains_key(CACHE_CONTROL));

    let hit = get(&service, "/").await;
    assert_eq!(hit.headers()[X_CACHE], "HIT");
    assert!(!hit.headers().contains_key(CACHE_CONTROL));
    assert!(!hit.headers().contains_key(EXPIRES));

    let age: u64 = hit.headers()[AGE].to_str().unwrap().parse().unwrap();
    assert!(age >= 1, "age={}", age);

    assert_eq!(calls.count(), 1);
}

#[tokio::test]
async fn debug_markup_is_rewritten_on_hit() {
    const PAGE: &str = r#"<pre><b>Age:</b> <span class="lit">0</span>
<b>X-Cache:</b> <span class="lit">MISS</span></pre>"#;

    let calls = Calls::default();
    let service = CacheView::new()
        .layer(&settings(Some(60)), &moka())
        .unwrap()
        .layer(view(&calls, StatusCode::OK, &[("content-type", "text/html; charset=utf-8")], PAGE));

    assert_eq!(body(get(&service, "/").await).await, PAGE);

    let hit = get(&service, "/").await;
    let age = hit.headers()[AGE].to_str().unwrap().to_string();
    let content_length: usize = hit.headers()[CONTENT_LENGTH].to_str().unwrap().parse().unwrap();
    let hit = body(hit).await;
    let hit = str::from_utf8(&hit).unwrap();

    assert!(hit.contains(r#"<b>X-Cache:</b> <span class="lit">HIT</span>"#));
    assert!(hit.contains(&format!(r#"<b>Age:</b> <span class="lit">{}</span>"#, age)));
    assert_eq!(content_length, hit.len());
}

#[tokio::test]
async fn default_view_ids_do_not_share_entries() {
    let caches = moka();

    // Both closures have the same type name
    let first = CacheView::new()
        .layer(&settings(Some(60)), &caches)
        .unwrap()
        .layer(service_fn(|_request: Request<()>| async {
            Ok::<_, Infallible>(Response::new(TestBody::from(Bytes::from_static(b"first"))))
        }));
    let second = CacheView::new()
        .layer(&settings(Some(60)), &caches)
        .unwrap()
        .layer(service_fn(|_request: Request<()>| async {
            Ok::<_, Infallible>(Response::new(TestBody::from(Bytes::from_static(b"second"))))
        }));

    assert_ne!(first.view_id(), second.view_id());

    assert_eq!(body(get(&first, "/").await).await, "first");
    assert_eq!(body(get(&second, "/").await).await, "second");
    assert_eq!(body(get(&first, "/").await).await, "first");
}

// Shared cache that reports a fixed remaining time-to-live ([None] for an entry gone since read)
#[derive(Clone)]
struct TtlCache {
    entries: Arc<Mutex<HashMap<CacheKey, CachedResponseRef>>>,
    remaining: Option<Duration>,
}

impl TtlCache {
    fn new(remaining: Option<Duration>) -> Self {
        Self {
            entries: Default::default(),
            remaining,
        }
    }
}

impl Cache for TtlCache {
    async fn get(&self, key: &CacheKey) -> Option<CachedResponseRef> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    async fn set(&self, key: CacheKey, cached_response: CachedResponseRef) {
        self.entries.lock().unwrap().insert(key, cached_response);
    }

    fn capability(&self) -> CacheCapability {
        CacheCapability::Ttl
    }

    async fn probe(&self, _key: &CacheKey, _cached_response: &CachedResponse) -> CacheProbe {
        match self.remaining {
            Some(remaining) => CacheProbe::Ttl(remaining),
            None => CacheProbe::Absent,
        }
    }
}

fn age(response: &Response<TestBody>) -> u64 {
    response.headers()[AGE].to_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn ttl_cache_hit() {
    let calls = Calls::default();
    let service = CacheView::new()
        .layer(&settings(Some(60)), &Caches::single(TtlCache::new(Some(Duration::from_secs(50)))))
        .unwrap()
        .layer(view(&calls, StatusCode::OK, &[], "ok"));

    let miss = get(&service, "/").await;
    assert_eq!(miss.headers()[X_CACHE], "MISS");
    assert_eq!(age(&miss), 0);
    assert!(!miss.headers().contains_key(EXPIRES));

    let hit = get(&service, "/").await;
    assert_eq!(hit.headers()[X_CACHE], "HIT");
    assert_eq!(age(&hit), 10);
    assert!(hit.headers().contains_key(EXPIRES));
    assert_eq!(calls.count(), 1);
}

#[tokio::test]
async fn ttl_cache_entry_gone_since_read() {
    let calls = Calls::default();
    let service = CacheView::new()
        .layer(&settings(Some(60)), &Caches::single(TtlCache::new(None)))
        .unwrap()
        .layer(view(&calls, StatusCode::OK, &[], "ok"));

    get(&service, "/").await;

    let hit = get(&service, "/").await;
    assert_eq!(hit.headers()[X_CACHE], "HIT");
    assert_eq!(age(&hit), 59);
    assert!(hit.headers().contains_key(EXPIRES));
}

#[tokio::test]
async fn ttl_cache_never_expiring() {
    let calls = Calls::default();
    let service = CacheView::new()
        .timeout(Timeout::Never)
        .layer(&settings(None), &Caches::single(TtlCache::new(None)))
        .unwrap()
        .layer(view(&calls, StatusCode::OK, &[], "ok"));

    get(&service, "/").await;

    let hit = get(&service, "/").await;
    assert_eq!(hit.headers()[X_CACHE], "HIT");
    assert!(age(&hit) >= 1);
    assert!(!hit.headers().contains_key(EXPIRES));
}

#[tokio::test]
async fn dummy_cache_never_hits() {
    let calls = Calls::default();
    let service = CacheView::new()
        .layer(&settings(Some(60)), &Caches::single(DummyCache))
        .unwrap()
        .layer(view(&calls, StatusCode::OK, &[], "ok"));

    for _ in 0..2 {
        let response = get(&service, "/").await;
        assert_eq!(response.headers()[X_CACHE], "MISS");

        // The dummy cache cannot tell ages
        assert!(!response.headers().contains_key(AGE));
    }

    assert_eq!(calls.count(), 2);
}

#[test]
fn unsupported_header() {
    let settings = Settings {
        timeout: Some(60),
        headers: Some(vec!["Age".into()]),
        ..Default::default()
    };

    assert!(matches!(
        CacheView::new().layer(&settings, &Caches::single(DummyCache)),
        Err(ConfigurationError::HeaderNotSupported { header: CacheHeader::Age, .. })
    ));
}

#[test]
fn cache_not_found() {
    let settings = Settings {
        cache: "elsewhere".into(),
        timeout: Some(60),
        ..Default::default()
    };

    assert!(matches!(
        CacheView::new().layer(&settings, &Caches::single(DummyCache)),
        Err(ConfigurationError::CacheNotFound(name)) if name == "elsewhere"
    ));
}

#[test]
fn invalid_timeouts() {
    let caches = Caches::single(DummyCache);

    assert!(matches!(
        CacheView::new().layer(&settings(None), &caches),
        Err(ConfigurationError::InvalidArgument(_))
    ));
    assert!(matches!(
        CacheView::new()
            .timeout(Timeout::After(Duration::from_millis(500)))
            .layer(&settings(Some(60)), &caches),
        Err(ConfigurationError::InvalidArgument(_))
    ));
    assert!(
        CacheView::new()
            .timeout(Timeout::seconds(1))
            .layer(&settings(None), &caches)
            .is_ok()
    );
}

#[test]
fn view_required() {
    assert!(matches!(
        CacheView::new()
            .key(ObjectKey)
            .layer(&settings(Some(60)), &Caches::single(DummyCache)),
        Err(ConfigurationError::InvalidArgument(message)) if message.contains("ObjectKey")
    ));
}

#[test]
fn renderers_required() {
    assert!(matches!(
        CacheView::new()
            .renderers(Vec::new())
            .layer(&settings(Some(60)), &Caches::single(DummyCache)),
        Err(ConfigurationError::InvalidArgument(_))
    ));
}
