use super::{cache::*, headers::*};

use std::{fmt, sync::*, time::*};

/// Common reference type for [FreshnessDeriver].
pub type FreshnessDeriverRef = Arc<dyn FreshnessDeriver>;

//
// Freshness
//

/// Freshness of a cache hit.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Freshness {
    /// Age in seconds.
    pub age: Option<u64>,

    /// Absolute expiry.
    pub expires: Option<SystemTime>,
}

impl Freshness {
    /// For an entry with a timeout and the time it has left.
    pub fn remaining(remaining: Duration, timeout: Duration, now: SystemTime) -> Self {
        Self {
            age: Some(clamp_age(timeout.as_secs_f64() - remaining.as_secs_f64(), timeout)),
            expires: now.checked_add(remaining),
        }
    }

    /// For an entry that never expires.
    ///
    /// The age is the time since it was stored, at least 1 second. There is no expiry.
    pub fn elapsed(stored_at: SystemTime, now: SystemTime) -> Self {
        let elapsed = now.duration_since(stored_at).unwrap_or_default();
        Self {
            age: Some((elapsed.as_secs_f64().round() as u64).max(1)),
            expires: None,
        }
    }
}

//
// FreshnessDeriver
//

/// Derives the [Freshness] of a cache hit from a [CacheProbe].
///
/// Chosen once per layer according to the [CacheCapability] of the cache.
pub trait FreshnessDeriver
where
    Self: fmt::Debug + Send + Sync,
{
    /// Whether the header can be derived at all.
    fn supports(&self, header: CacheHeader) -> bool;

    /// Derive.
    ///
    /// A [None] timeout means the entry never expires, so the age is counted from `stored_at`
    /// and there is no expiry.
    fn derive(
        &self,
        probe: &CacheProbe,
        timeout: Option<Duration>,
        stored_at: SystemTime,
        now: SystemTime,
    ) -> Freshness;
}

/// The [FreshnessDeriver] for a [CacheCapability].
pub fn freshness_deriver(capability: CacheCapability) -> FreshnessDeriverRef {
    match capability {
        CacheCapability::Ttl => Arc::new(TtlFreshness),
        CacheCapability::Expiry => Arc::new(ExpiryFreshness),
        CacheCapability::None => Arc::new(UnknownFreshness),
    }
}

/// Clamp an age to `[1, timeout - 1]` seconds, rounding to the nearest second.
///
/// With a one-second timeout the age is always 1.
pub fn clamp_age(age: f64, timeout: Duration) -> u64 {
    let max = timeout.as_secs().saturating_sub(1).max(1);
    let age = age.round();
    if age <= 1. {
        1
    } else if age >= max as f64 {
        max
    } else {
        age as u64
    }
}

//
// TtlFreshness
//

/// For caches that report the remaining time-to-live.
#[derive(Clone, Copy, Debug, Default)]
pub struct TtlFreshness;

impl FreshnessDeriver for TtlFreshness {
    fn supports(&self, _header: CacheHeader) -> bool {
        true
    }

    fn derive(
        &self,
        probe: &CacheProbe,
        timeout: Option<Duration>,
        stored_at: SystemTime,
        now: SystemTime,
    ) -> Freshness {
        match timeout {
            Some(timeout) => {
                // Gone since it was read
                let remaining = match probe {
                    CacheProbe::Ttl(remaining) => *remaining,
                    _ => Duration::ZERO,
                };
                Freshness::remaining(remaining, timeout, now)
            }

            None => Freshness::elapsed(stored_at, now),
        }
    }
}

//
// ExpiryFreshness
//

/// For caches that keep the absolute expiry of each entry.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExpiryFreshness;

impl FreshnessDeriver for ExpiryFreshness {
    fn supports(&self, _header: CacheHeader) -> bool {
        true
    }

    fn derive(
        &self,
        probe: &CacheProbe,
        timeout: Option<Duration>,
        stored_at: SystemTime,
        now: SystemTime,
    ) -> Freshness {
        match timeout {
            Some(timeout) => {
                let remaining = match probe {
                    CacheProbe::ExpiresAt(expires_at) => {
                        expires_at.duration_since(now).unwrap_or_default()
                    }
                    _ => Duration::ZERO,
                };
                Freshness::remaining(remaining, timeout, now)
            }

            None => Freshness::elapsed(stored_at, now),
        }
    }
}

//
// UnknownFreshness
//

/// For caches that cannot tell.
///
/// Neither `Age` nor `Expires` can be derived.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnknownFreshness;

impl FreshnessDeriver for UnknownFreshness {
    fn supports(&self, header: CacheHeader) -> bool {
        !matches!(header, CacheHeader::Age | CacheHeader::Expires)
    }

    fn derive(
        &self,
        _probe: &CacheProbe,
        _timeout: Option<Duration>,
        _stored_at: SystemTime,
        _now: SystemTime,
    ) -> Freshness {
        Freshness::default()
    }
}
