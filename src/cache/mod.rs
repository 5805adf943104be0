mod cache;
mod caches;
mod error;
mod freshness;
mod headers;
mod key;
mod markup;
mod response;
mod settings;
mod weight;

/// Cache axum utilities.
#[cfg(feature = "axum")]
pub mod axum;

/// Cache implementations.
pub mod implementation;

/// Cache middleware utilities.
pub mod middleware;

#[allow(unused_imports)]
pub use {
    cache::*, caches::*, error::*, freshness::*, headers::*, key::*, markup::*, response::*,
    settings::*, weight::*,
};
