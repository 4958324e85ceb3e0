//! DOM access for form matching.
//!
//! Pages arrive as HTML text and are parsed with `scraper`; nothing here
//! mutates the tree.

mod form;
mod signals;
mod text;

pub use form::*;
pub use signals::*;
pub use text::*;
