mod configuration;
mod request;
mod responses;

#[allow(unused_imports)]
pub use {configuration::*, request::*, responses::*};
