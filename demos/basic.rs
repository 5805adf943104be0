mod utils;

use {
    ::axum::{extract::*, routing::*, *},
    std::sync::*,
    tokio::{net::*, *},
    tower_http::trace::*,
    tower_http_view_cache::{
        cache::{implementation::moka::*, *},
        *,
    },
};

// Axum server with a view cache on a single route
//
// Pay attention to the tracing log to see what the cache is doing!
// (Entries expire after 10 seconds)
//
//   curl --verbose http://localhost:8080/greet/world
//   curl --verbose http://localhost:8080/greet/world?format=api
//
// The second request for the same name and format is a HIT, with an `Age` header counting up

// Not the actual maximum memory use, but a limit on the total of entry weights
const CACHE_SIZE: u64 = 1024 * 1024; // 1 MiB

#[main]
async fn main() {
    utils::init_tracing();

    let cache = moka::future::Cache::<CacheKey, CachedResponseRef>::builder()
        .name("views")
        .for_view_cache()
        .max_capacity(CACHE_SIZE)
        .eviction_listener(|key, _value, cause| {
            tracing::debug!("evict ({:?}): {}", cause, key);
        })
        .build();

    let caches = Caches::single(Arc::new(cache));

    let settings = Settings {
        timeout: Some(10),
        ..Default::default()
    };

    let greet = CacheView::new()
        .key(PathParamsKey::new(["name"]).expect("PathParamsKey"))
        .layer(&settings, &caches)
        .expect("CacheView::layer");

    let router = Router::default()
        .route(
            "/greet/{name}",
            get(async |Path(name): Path<String>| format!("Hello, {}!\n", name)).layer(greet),
        )
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind("[::]:8080")
        .await
        .expect("TcpListener::bind");
    // If IPv6 is disabled on your machine:
    // let listener = TcpListener::bind("0.0.0.0:8080").await.expect("bind");
    tracing::info!("bound to: {:?}", listener.local_addr());
    serve(listener, router).await.expect("axum::serve");
}
