use regex::{Captures, Regex};
use std::borrow::Cow;

/// A built-in transform applied to the path of every rewritten link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameRule {
    /// Replace `README` with `index`, for servers that map directories to
    /// their `index.html`.
    ReadmeToIndex,
}

impl RenameRule {
    fn apply(self, path: &str) -> String {
        match self {
            Self::ReadmeToIndex => path.replace("README", "index"),
        }
    }
}

/// Rewrites relative Markdown links in raw Markdown source to be HTML links.
/// So a link to `./foo.md` becomes a link to `./foo.html`, but anything that
/// starts with `http` is left unchanged.
///
/// Both inline links (`[text](foo.md)`) and reference definitions
/// (`[label]: foo.md`) are handled. Only the URL is ever touched, never the
/// link text.
pub struct LinkRewriter {
    rules: Vec<RenameRule>,
    inline: Regex,
    reference: Regex,
}

impl LinkRewriter {
    pub fn new(rules: Vec<RenameRule>) -> Self {
        Self {
            rules,
            inline: Regex::new(r"(\[.*?\]\()([^()\s]*?)\.md(#[^()\s]*)?\)")
                .expect("valid inline link pattern"),
            reference: Regex::new(r"(?m)^( {0,3}\[[^\]\n]*\]:[ \t]+)(\S*?)\.md(#\S*)?[ \t]*(\r?)$")
                .expect("valid reference link pattern"),
        }
    }

    /// Rewrite all the relative `.md` links in `source`. Returns the input
    /// unchanged (and borrowed) if there is nothing to do.
    pub fn rewrite<'a>(&self, source: &'a str) -> Cow<'a, str> {
        let inline = self.inline.replace_all(source, |caps: &Captures| {
            self.rewrite_match(caps, |path, frag| format!("{path}.html{frag})"))
        });
        let reference = match self.reference.replace_all(&inline, |caps: &Captures| {
            let cr = caps.get(4).map_or("", |m| m.as_str());
            self.rewrite_match(caps, |path, frag| format!("{path}.html{frag}{cr}"))
        }) {
            Cow::Owned(s) => Some(s),
            Cow::Borrowed(_) => None,
        };
        match reference {
            Some(s) => Cow::Owned(s),
            None => inline,
        }
    }

    /// Rebuild one matched link. Capture 1 is everything before the path,
    /// capture 2 the path without its `.md`, capture 3 an optional fragment.
    fn rewrite_match(&self, caps: &Captures, finish: impl Fn(&str, &str) -> String) -> String {
        let path = &caps[2];
        if is_absolute_url(path) {
            return caps[0].to_string();
        }
        let frag = caps.get(3).map_or("", |m| m.as_str());
        format!("{}{}", &caps[1], finish(&self.rename(path), frag))
    }

    /// Run a path through every rename rule, in order.
    fn rename(&self, path: &str) -> String {
        self.rules
            .iter()
            .fold(path.to_string(), |path, rule| rule.apply(&path))
    }
}

/// Only `http` and `https` URLs count as absolute. Any other scheme is
/// treated like a relative path.
fn is_absolute_url(url: &str) -> bool {
    url.starts_with("http")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(source: &str) -> String {
        LinkRewriter::new(vec![]).rewrite(source).into_owned()
    }

    fn rewrite_readme(source: &str) -> String {
        LinkRewriter::new(vec![RenameRule::ReadmeToIndex])
            .rewrite(source)
            .into_owned()
    }

    #[test]
    fn full_url_is_absolute() {
        assert!(is_absolute_url("http://foo.org/bar"));
        assert!(is_absolute_url("https://foo.org/bar"));
    }

    #[test]
    fn dot_is_relative() {
        assert!(!is_absolute_url("./bar"));
    }

    #[test]
    fn other_scheme_is_relative() {
        assert!(!is_absolute_url("mailto:me@example.com"));
    }

    #[test]
    fn relative_md_link() {
        assert_eq!(rewrite("[hi](bar.md)"), "[hi](bar.html)");
    }

    #[test]
    fn absolute_md_link() {
        assert_eq!(
            rewrite("[hi](http://foo.com/bar.md)"),
            "[hi](http://foo.com/bar.md)"
        );
    }

    #[test]
    fn relative_other_link() {
        assert_eq!(rewrite("[hi](./bar.png)"), "[hi](./bar.png)");
    }

    #[test]
    fn fragment_is_kept() {
        assert_eq!(rewrite("[hi](a/b.md#usage)"), "[hi](a/b.html#usage)");
    }

    #[test]
    fn several_links_on_a_line() {
        assert_eq!(
            rewrite("see [a](http://x.org/a.md) and [b](b.md), [c](c.md)."),
            "see [a](http://x.org/a.md) and [b](b.html), [c](c.html)."
        );
    }

    #[test]
    fn image_inside_link() {
        assert_eq!(
            rewrite("[![logo](logo.png)](docs/intro.md)"),
            "[![logo](logo.png)](docs/intro.html)"
        );
    }

    #[test]
    fn relative_md_link_refstyle() {
        assert_eq!(rewrite("[x]: ./a.md"), "[x]: ./a.html");
    }

    #[test]
    fn refstyle_among_other_lines() {
        assert_eq!(
            rewrite("[hi][h]\n\n[h]: ./bar.md  \n[w]: https://w.org/x.md\n"),
            "[hi][h]\n\n[h]: ./bar.html\n[w]: https://w.org/x.md\n"
        );
    }

    #[test]
    fn refstyle_crlf() {
        assert_eq!(rewrite("[x]: a.md\r\nnext"), "[x]: a.html\r\nnext");
    }

    #[test]
    fn readme_to_index() {
        assert_eq!(
            rewrite_readme("[README_ja](./README_ja.md)"),
            "[README_ja](./index_ja.html)"
        );
    }

    #[test]
    fn readme_to_index_refstyle() {
        assert_eq!(
            rewrite_readme("[README_ja]: ./README_ja.md"),
            "[README_ja]: ./index_ja.html"
        );
    }

    #[test]
    fn readme_rule_leaves_absolute_alone() {
        assert_eq!(
            rewrite_readme("[r](https://github.com/x/README.md)"),
            "[r](https://github.com/x/README.md)"
        );
    }

    #[test]
    fn uppercase_extension_is_not_rewritten() {
        assert_eq!(rewrite("[hi](bar.MD)"), "[hi](bar.MD)");
    }

    #[test]
    fn nothing_to_do_borrows() {
        let rewriter = LinkRewriter::new(vec![]);
        assert!(matches!(rewriter.rewrite("# hi\n"), Cow::Borrowed(_)));
    }

    #[test]
    fn idempotent() {
        let rewriter = LinkRewriter::new(vec![RenameRule::ReadmeToIndex]);
        let once = rewriter.rewrite("[a](README.md)\n\n[b]: c.md\n").into_owned();
        assert_eq!(rewriter.rewrite(&once), once);
    }
}
