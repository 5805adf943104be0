mod builder;
mod cache;
mod expiry;

#[allow(unused_imports)]
pub use {builder::*, cache::*, expiry::*};
