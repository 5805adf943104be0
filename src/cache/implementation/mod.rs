mod dummy;

/// Moka cache implementation.
#[cfg(feature = "moka")]
pub mod moka;

/// Redis cache implementation.
#[cfg(feature = "redis")]
pub mod redis;

#[allow(unused_imports)]
pub use dummy::*;
