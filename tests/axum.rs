use {
    async_trait::async_trait,
    ::axum::{
        Router,
        body::Body,
        extract::Path,
        http::{Request, StatusCode, header::*},
        routing::get,
    },
    serde_json::{Value, json},
    std::{
        collections::BTreeMap,
        sync::{
            Arc, Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    },
    tower::ServiceExt,
    tower_http_view_cache::{
        cache::{axum::*, implementation::moka::*, *},
        *,
    },
};

fn caches() -> Caches<MokaCacheImplementation> {
    Caches::single(Arc::new(
        ::moka::future::Cache::<CacheKey, CachedResponseRef>::builder()
            .for_view_cache()
            .build(),
    ))
}

fn settings() -> Settings {
    Settings {
        timeout: Some(300),
        ..Default::default()
    }
}

async fn x_cache(router: &Router, uri: &str) -> String {
    let response = router
        .clone()
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    response.headers()[X_CACHE].to_str().unwrap().into()
}

#[tokio::test]
async fn path_params_distinguish_entries() {
    let calls = Arc::new(AtomicUsize::new(0));
    let layer = CacheView::new()
        .key(PathParamsKey::new(["id"]).unwrap())
        .layer(&settings(), &caches())
        .unwrap();

    let router = Router::new().route(
        "/articles/{id}",
        get({
            let calls = calls.clone();
            move |Path(id): Path<String>| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                format!("article {}", id)
            }
        })
        .layer(layer),
    );

    assert_eq!(x_cache(&router, "/articles/1").await, "MISS");
    assert_eq!(x_cache(&router, "/articles/2").await, "MISS");
    assert_eq!(x_cache(&router, "/articles/1").await, "HIT");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn routes_have_separate_entries() {
    let caches = caches();
    let layer = CacheView::new().layer(&settings(), &caches).unwrap();

    let router = Router::new()
        .route("/one", get(|| async { "one" }).layer(layer.clone()))
        .route("/two", get(|| async { "two" }).layer(layer));

    assert_eq!(x_cache(&router, "/one").await, "MISS");
    assert_eq!(x_cache(&router, "/two").await, "MISS");
    assert_eq!(x_cache(&router, "/one").await, "HIT");
}

#[tokio::test]
async fn view_can_opt_out() {
    let layer = CacheView::new().layer(&settings(), &caches()).unwrap();

    let router = Router::new().route(
        "/",
        get(|| async {
            "live"
                .with_x_cache("BYPASS")
                .with_max_age(std::time::Duration::from_secs(5))
        })
        .layer(layer),
    );

    let response = router
        .clone()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.headers()[X_CACHE], "BYPASS");
    assert_eq!(response.headers()[CACHE_CONTROL], "max-age=5");
}

// In-memory articles; a new revision changes the object's facets

#[derive(Default)]
struct Articles(Mutex<BTreeMap<String, u64>>);

impl Articles {
    fn revise(&self, id: &str) {
        *self.0.lock().unwrap().entry(id.into()).or_default() += 1;
    }
}

#[async_trait]
impl View for Articles {
    fn lookup_field(&self) -> &str {
        "id"
    }

    async fn object(&self, context: &KeyContext<'_>) -> Result<Option<Facets>, ViewError> {
        let Some(id) = context.path_params.get(self.lookup_field()) else {
            return Ok(None);
        };

        let revision = self.0.lock().unwrap().get(id).copied();
        Ok(revision.and_then(|revision| match json!({ "id": id, "revision": revision }) {
            Value::Object(fields) => Some(fields),
            _ => None,
        }))
    }
}

#[tokio::test]
async fn object_changes_invalidate() {
    let articles = Arc::new(Articles::default());
    articles.revise("1");

    let layer = CacheView::new()
        .key(ObjectKey)
        .view_ref(articles.clone())
        .layer(&settings(), &caches())
        .unwrap();

    let router = Router::new().route(
        "/articles/{id}",
        get(|Path(id): Path<String>| async move { format!("article {}", id) }).layer(layer),
    );

    assert_eq!(x_cache(&router, "/articles/1").await, "MISS");
    assert_eq!(x_cache(&router, "/articles/1").await, "HIT");

    articles.revise("1");
    assert_eq!(x_cache(&router, "/articles/1").await, "MISS");
    assert_eq!(x_cache(&router, "/articles/1").await, "HIT");
}

#[tokio::test]
async fn format_distinguishes_entries() {
    let layer = CacheView::new().layer(&settings(), &caches()).unwrap();
    let router = Router::new().route("/", get(|| async { "body" }).layer(layer));

    assert_eq!(x_cache(&router, "/?format=json").await, "MISS");
    assert_eq!(x_cache(&router, "/?format=api").await, "MISS");
    assert_eq!(x_cache(&router, "/?format=json").await, "HIT");

    let response = router
        .clone()
        .oneshot(
            Request::get("/")
                .header(ACCEPT, "text/html")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()[X_CACHE], "HIT");
}
