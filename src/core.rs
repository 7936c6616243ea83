use crate::assets::embed_assets;
use crate::markdown::{
    CmarkRenderer, HeadingScanner, LinkRewriter, RenameRule, Renderer, SlugRegistry,
    write_outline,
};
use anyhow::{Context as _, Result};
use serde::Deserialize;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::{fmt, fs};

embed_assets!(TEMPLATES, "templates", ["head.html", "github.css", "page.css"]);

/// Where to read a Markdown document from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Stdin,
    File(PathBuf),
}

impl Source {
    /// Interpret a command-line argument, where `-` means standard input.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            Self::Stdin
        } else {
            Self::File(arg.into())
        }
    }

    /// Read the whole source as text. Invalid UTF-8 is replaced rather than
    /// rejected.
    pub fn read(&self) -> Result<String> {
        let bytes = match self {
            Self::Stdin => {
                let mut buf = vec![];
                io::stdin().lock().read_to_end(&mut buf)?;
                buf
            }
            Self::File(path) => fs::read(path)?,
        };
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(source = %self, "replacing invalid UTF-8");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        })
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str("<stdin>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// The page title, given directly or taken from the first line of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Title {
    Text(String),
    File(Source),
}

impl Title {
    pub fn resolve(&self) -> Result<String> {
        match self {
            Self::Text(text) => Ok(text.clone()),
            Self::File(source) => {
                let text = source
                    .read()
                    .with_context(|| format!("reading title from {source}"))?;
                Ok(text.lines().next().unwrap_or_default().trim().to_string())
            }
        }
    }
}

/// Everything that goes into one generated page.
#[derive(Debug, Default)]
pub struct Page {
    pub header: Option<Source>,
    pub bodies: Vec<Source>,
    pub footer: Option<Source>,
    pub sidebar: Option<Source>,
    /// Link to this stylesheet instead of inlining the built-in one.
    pub css_url: Option<String>,
    pub title: Option<Title>,
    /// Put an outline of the body headings at the top of the sidebar.
    pub outline: bool,
}

/// Assembles HTML pages from Markdown sources.
pub struct Context<R: Renderer = CmarkRenderer> {
    renderer: R,
    rewriter: LinkRewriter,
    scanner: HeadingScanner,
    tmpls: minijinja::Environment<'static>,
}

impl Context<CmarkRenderer> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            CmarkRenderer::new(config.anchor_text.clone()),
            config.rename_rules(),
        )
    }
}

impl<R: Renderer> Context<R> {
    pub fn new(renderer: R, rules: Vec<RenameRule>) -> Self {
        let mut tmpls = minijinja::Environment::new();
        for (name, source) in TEMPLATES.contents().filter(|(n, _)| n.ends_with(".html")) {
            tmpls
                .add_template(name, source)
                .expect("embedded template must be valid Jinja code");
        }

        Self {
            renderer,
            rewriter: LinkRewriter::new(rules),
            scanner: HeadingScanner::new(),
            tmpls,
        }
    }

    /// Render a whole page to `dest`.
    ///
    /// Output is written as it is produced, so after an error `dest` holds
    /// an incomplete page.
    pub fn render_page<W: Write>(&self, page: &Page, dest: &mut W) -> Result<()> {
        let title = page.title.as_ref().map(Title::resolve).transpose()?;
        self.write_head(title.as_deref(), page.css_url.as_deref(), dest)?;

        writeln!(dest, "<div class=\"main markdown-body\">")?;
        if let Some(header) = &page.header {
            self.render_source(header, "header", &mut SlugRegistry::new(), dest)?;
        }

        // The bodies share one registry, just like the outline scan of their
        // concatenation does, so the ids match.
        let mut body_slugs = SlugRegistry::new();
        let mut composed = String::new();
        for body in &page.bodies {
            let rewritten = self.render_source(body, "body", &mut body_slugs, dest)?;
            if !composed.is_empty() && !composed.ends_with('\n') {
                composed.push('\n');
            }
            composed.push_str(&rewritten);
        }

        if let Some(footer) = &page.footer {
            self.render_source(footer, "footer", &mut SlugRegistry::new(), dest)?;
        }
        writeln!(dest, "</div><!-- \"main\" -->")?;

        if page.outline || page.sidebar.is_some() {
            writeln!(dest, "<div class=\"sidebar markdown-body\">")?;
            if page.outline {
                self.render_outline(&composed, dest)?;
            }
            if let Some(sidebar) = &page.sidebar {
                let source = sidebar
                    .read()
                    .with_context(|| format!("reading {sidebar}"))?;
                self.render_markdown(&source, &mut SlugRegistry::new(), dest)
                    .with_context(|| format!("rendering {sidebar}"))?;
            }
            writeln!(dest, "</div><!-- \"sidebar\" -->")?;
        }

        writeln!(dest, "</body></html>")?;
        Ok(())
    }

    fn write_head<W: Write>(
        &self,
        title: Option<&str>,
        css_url: Option<&str>,
        dest: &mut W,
    ) -> Result<()> {
        let tmpl = self.tmpls.get_template("head.html")?;
        tmpl.render_to_write(
            minijinja::context! {
                title => title,
                css_url => css_url,
                base_css => TEMPLATES.require("github.css")?,
                page_css => TEMPLATES.require("page.css")?,
            },
            &mut *dest,
        )?;
        writeln!(dest)?;
        Ok(())
    }

    /// Render one source into its own `<div>`. Returns the source text after
    /// link rewriting.
    fn render_source<W: Write>(
        &self,
        source: &Source,
        class: &str,
        slugs: &mut SlugRegistry,
        dest: &mut W,
    ) -> Result<String> {
        tracing::debug!(%source, class, "rendering");
        let text = source.read().with_context(|| format!("reading {source}"))?;

        writeln!(dest, "<div class=\"{class}\">")?;
        let rewritten = self
            .render_markdown(&text, slugs, dest)
            .with_context(|| format!("rendering {source}"))?;
        writeln!(dest, "</div><!-- \"{class}\" -->")?;

        Ok(rewritten)
    }

    /// Rewrite links in some Markdown and render it. Returns the rewritten
    /// Markdown.
    fn render_markdown<W: Write>(
        &self,
        markdown: &str,
        slugs: &mut SlugRegistry,
        dest: &mut W,
    ) -> Result<String> {
        let rewritten = self.rewriter.rewrite(markdown);
        self.renderer.render(&rewritten, slugs, dest)?;
        Ok(rewritten.into_owned())
    }

    /// Render a linked list of the headings in `markdown`.
    fn render_outline<W: Write>(&self, markdown: &str, dest: &mut W) -> Result<()> {
        let headings = self.scanner.scan_str(markdown);
        tracing::debug!(count = headings.len(), "rendering outline");

        let mut outline = vec![];
        write_outline(&headings, "", "\n", &mut outline)?;
        let outline = String::from_utf8(outline).context("outline is not UTF-8")?;
        self.render_markdown(&outline, &mut SlugRegistry::new(), dest)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Stylesheet URL to link to.
    pub css: Option<String>,
    /// Text of the self-link added to every heading. Empty for none.
    pub anchor_text: Option<String>,
    /// Rewrite `README` to `index` in relative link targets.
    pub readme_to_index: bool,
    /// Include an outline in the sidebar.
    pub outline: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            css: None,
            anchor_text: Some(".".to_string()),
            readme_to_index: false,
            outline: false,
        }
    }
}

impl Config {
    pub const FILE_NAME: &'static str = "minipage.toml";

    /// Load `minipage.toml` from a directory, if there is one there.
    pub fn load(dir: &Path) -> Result<Self> {
        match fs::read_to_string(dir.join(Self::FILE_NAME)) {
            // Silently proceed if the file isn't found, but crash on other errors.
            Err(ref e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e)?,
            Ok(s) => Self::parse(&s),
        }
    }

    /// Load a configuration file that must exist.
    pub fn from_file(path: &Path) -> Result<Self> {
        let s = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&s).with_context(|| format!("parsing config {}", path.display()))
    }

    fn parse(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn rename_rules(&self) -> Vec<RenameRule> {
        let mut rules = vec![];
        if self.readme_to_index {
            rules.push(RenameRule::ReadmeToIndex);
        }
        rules
    }
}
