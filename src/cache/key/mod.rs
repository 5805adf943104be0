mod composer;
mod format;
mod key;
mod object;
mod pagination;
mod request;
mod strategy;
mod view;

#[allow(unused_imports)]
pub use {
    composer::*, format::*, key::*, object::*, pagination::*, request::*, strategy::*, view::*,
};
