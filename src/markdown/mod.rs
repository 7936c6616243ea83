mod add_ids;
mod front_matter;
pub mod outline;
pub mod rel_links;
pub mod slug;

pub use outline::{Heading, HeadingScanner, write_outline};
pub use rel_links::{LinkRewriter, RenameRule};
pub use slug::{SlugRegistry, slugify};

use anyhow::Result;
use pulldown_cmark::{Options, Parser, html};
use std::io::Write;

/// Turns one Markdown document into an HTML fragment.
///
/// Heading ids must come from `slugs` so that they line up with an outline
/// scanned from the same source.
pub trait Renderer {
    fn render<W: Write>(&self, source: &str, slugs: &mut SlugRegistry, out: &mut W) -> Result<()>;
}

/// The pulldown-cmark renderer, with GitHub-ish extensions.
#[derive(Debug, Default)]
pub struct CmarkRenderer {
    /// Link text for a self-link placed inside every heading, if any.
    pub anchor_text: Option<String>,
}

impl CmarkRenderer {
    /// An empty anchor text means no anchors.
    pub fn new(anchor_text: Option<String>) -> Self {
        Self {
            anchor_text: anchor_text.filter(|text| !text.is_empty()),
        }
    }

    fn options() -> Options {
        // Smart punctuation and heading attributes would change heading text
        // behind the outline scanner's back, so they stay off.
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_YAML_STYLE_METADATA_BLOCKS);
        options
    }
}

impl Renderer for CmarkRenderer {
    fn render<W: Write>(&self, source: &str, slugs: &mut SlugRegistry, out: &mut W) -> Result<()> {
        let iter = Parser::new_ext(source, Self::options());
        let iter = front_matter::FrontMatterTable::new(iter);
        let iter = add_ids::AddHeadingIds::new(iter, slugs, self.anchor_text.as_deref());
        html::write_html_io(out, iter)?;
        Ok(())
    }
}
