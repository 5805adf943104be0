mod cached;
mod failure;
mod upstream;

#[allow(unused_imports)]
pub use {cached::*, failure::*, upstream::*};
