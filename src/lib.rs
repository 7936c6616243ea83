//! Build standalone HTML pages from Markdown, with a generated outline of
//! the page's headings and relative `.md` links pointing at `.html` files.

pub mod assets;
pub mod core;
pub mod markdown;

pub use crate::core::{Config, Context, Page, Source, Title};
