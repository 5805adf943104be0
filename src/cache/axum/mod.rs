mod headers;
mod params;

#[allow(unused_imports)]
pub use {headers::*, params::*};
