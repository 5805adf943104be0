mod utils;

use {
    ::axum::{
        extract::*,
        http::StatusCode,
        middleware::{self, Next},
        response::{Html, IntoResponse, Response},
        routing::*,
        *,
    },
    async_trait::async_trait,
    serde::Serialize,
    serde_json::{Value, json},
    std::{collections::*, sync::*},
    tokio::{net::*, *},
    tower_http::trace::*,
    tower_http_view_cache::{
        cache::{axum::*, implementation::moka::*, *},
        *,
    },
};

// (See basic.rs first)
//
// Axum server with several cached views over an in-memory article store
//
// Settings come from VIEW_CACHE_* environment variables (the timeout defaults to 10 seconds), e.g.:
//
//   VIEW_CACHE_TIMEOUT=30 VIEW_CACHE_HEADERS=x-cache,etag cargo run --example advanced --features axum
//
// Some fun requests:
//
//   curl --verbose http://localhost:8080/articles
//   curl --verbose http://localhost:8080/articles?page=2
//
//   curl --verbose http://localhost:8080/articles/1
//   curl --verbose --request PUT http://localhost:8080/articles/1
//   curl --verbose http://localhost:8080/articles/1
//
//   curl --verbose --header 'X-User: 7' http://localhost:8080/me
//
//   curl --verbose http://localhost:8080/live
//
// Open http://localhost:8080/debug in a browser and refresh: the header lines on the page follow
// the actual headers

const CACHE_SIZE: u64 = 1024 * 1024; // 1 MiB

const PAGE_SIZE: usize = 2;

#[main]
async fn main() {
    utils::init_tracing();

    let mut settings = Settings::load(None).expect("Settings::load");
    settings.timeout.get_or_insert(10);

    let cache = moka::future::Cache::<CacheKey, CachedResponseRef>::builder()
        .name("views")
        .for_view_cache()
        .max_capacity(CACHE_SIZE)
        .build();

    let caches = Caches::single(Arc::new(cache));

    let store = new_store();
    let view = Arc::new(ArticlesView(store.clone()));

    let list = CacheView::new()
        .view_id("articles.list")
        .key(QuerysetKey)
        .key(PaginationKey::new())
        .view_ref(view.clone())
        .layer(&settings, &caches)
        .expect("CacheView::layer");

    // New revisions change the object facets, so stale entries are never served
    let detail = CacheView::new()
        .view_id("articles.detail")
        .key(ObjectKey)
        .view_ref(view)
        .timeout(Timeout::Never)
        .layer(&settings, &caches)
        .expect("CacheView::layer");

    let me = CacheView::new()
        .key(UserKey)
        .timeout(Timeout::seconds(60))
        .layer(&settings, &caches)
        .expect("CacheView::layer");

    let live = CacheView::new().layer(&settings, &caches).expect("CacheView::layer");

    let debug = CacheView::new()
        .renderers(vec![Renderer::api()])
        .layer(&settings, &caches)
        .expect("CacheView::layer");

    let router = Router::default()
        .route("/articles", get(list_articles).layer(list))
        .route("/articles/{id}", get(show_article).put(revise_article).layer(detail))
        .route("/me", get(show_me).layer(me))
        .route(
            "/live",
            get(async || {
                "Not really cached\n"
                    .with_x_cache("BYPASS")
                    .with_max_age(Default::default())
            })
            .layer(live),
        )
        .route("/debug", get(debug_page).layer(debug))
        .with_state(store)
        .layer(middleware::from_fn(authenticate))
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind("[::]:8080")
        .await
        .expect("TcpListener::bind");
    // If IPv6 is disabled on your machine:
    // let listener = TcpListener::bind("0.0.0.0:8080").await.expect("bind");
    tracing::info!("bound to: {:?}", listener.local_addr());
    serve(listener, router).await.expect("axum::serve");
}

//
// Store
//

#[derive(Clone, Serialize)]
struct Article {
    id: u64,
    title: String,
    revision: u64,
}

type Store = Arc<RwLock<BTreeMap<u64, Article>>>;

fn new_store() -> Store {
    let articles = ["Caching", "Keys", "Facets", "Expiry", "Headers"]
        .into_iter()
        .enumerate()
        .map(|(index, title)| {
            let id = index as u64 + 1;
            (
                id,
                Article {
                    id,
                    title: title.into(),
                    revision: 1,
                },
            )
        })
        .collect();

    Arc::new(RwLock::new(articles))
}

fn page(articles: &BTreeMap<u64, Article>, page: usize) -> Vec<Article> {
    articles
        .values()
        .skip(page.saturating_sub(1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .cloned()
        .collect()
}

fn page_number(query: &BTreeMap<String, String>) -> usize {
    query.get("page").and_then(|page| page.parse().ok()).unwrap_or(1)
}

//
// ArticlesView
//

// What the key strategies see of the store
struct ArticlesView(Store);

#[async_trait]
impl View for ArticlesView {
    fn lookup_field(&self) -> &str {
        "id"
    }

    fn paginator(&self) -> Option<&Paginator> {
        static PAGINATOR: LazyLock<Paginator> = LazyLock::new(Paginator::page_number);
        Some(&*PAGINATOR)
    }

    async fn object(&self, context: &KeyContext<'_>) -> Result<Option<Facets>, ViewError> {
        let Some(id) = context.path_params.get(self.lookup_field()) else {
            return Ok(None);
        };
        let id: u64 = id.parse()?;

        let articles = self.0.read().map_err(|error| error.to_string())?;
        Ok(articles.get(&id).and_then(|article| match json!(article) {
            Value::Object(fields) => Some(fields),
            _ => None,
        }))
    }

    async fn queryset(&self, context: &KeyContext<'_>) -> Result<Vec<Value>, ViewError> {
        let query = QueryParams::from_uri(&context.request.uri);
        let page_number = query.get("page").and_then(|page| page.parse().ok()).unwrap_or(1);

        let articles = self.0.read().map_err(|error| error.to_string())?;
        Ok(page(&articles, page_number)
            .into_iter()
            .map(|article| json!([article.id, article.revision]))
            .collect())
    }
}

//
// Handlers
//

async fn list_articles(
    State(store): State<Store>,
    Query(query): Query<BTreeMap<String, String>>,
) -> Response {
    match store.read() {
        Ok(articles) => Json(page(&articles, page_number(&query))).into_response(),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn show_article(State(store): State<Store>, Path(id): Path<u64>) -> Response {
    match store.read() {
        Ok(articles) => match articles.get(&id) {
            Some(article) => Json(article.clone()).into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        },
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn revise_article(State(store): State<Store>, Path(id): Path<u64>) -> Response {
    match store.write() {
        Ok(mut articles) => match articles.get_mut(&id) {
            Some(article) => {
                article.revision += 1;
                tracing::info!("revised article {} to {}", id, article.revision);
                Json(article.clone()).into_response()
            }
            None => StatusCode::NOT_FOUND.into_response(),
        },
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn show_me(Extension(user): Extension<RequestUser>) -> Json<Value> {
    Json(json!({ "user": user.id }))
}

async fn debug_page() -> Html<&'static str> {
    Html(
        r#"<!DOCTYPE html>
<html><body><pre>
<b>HTTP 200 OK</b>
<b>Age:</b> <span class="lit">0</span>
<b>Cache-Control:</b> <span class="lit">max-age=10</span>
<b>X-Cache:</b> <span class="lit">MISS</span>
</pre></body></html>
"#,
    )
}

// Identify the user from the X-User header (demo only!)
async fn authenticate(mut request: extract::Request, next: Next) -> Response {
    let user = match request.headers().get("x-user").and_then(|value| value.to_str().ok()) {
        Some(id) => RequestUser::authenticated(id),
        None => RequestUser::anonymous(),
    };

    request.extensions_mut().insert(user);
    next.run(request).await
}
