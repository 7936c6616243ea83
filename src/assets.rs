use anyhow::{Result, anyhow};

type ContentList = &'static [(&'static str, &'static str)];

/// A set of text files compiled into the binary.
pub struct EmbeddedAssets {
    /// The directory the files were read from at build time.
    pub dir: &'static str,

    /// The names and contents of the assets.
    files: ContentList,
}

impl EmbeddedAssets {
    pub const fn new(dir: &'static str, files: ContentList) -> Self {
        Self { dir, files }
    }

    /// Get the contents of a file, if it is one of ours.
    pub fn get(&self, name: &str) -> Option<&'static str> {
        self.files.iter().find(|(n, _)| *n == name).map(|(_, c)| *c)
    }

    /// Like `get`, but a missing file is an error.
    pub fn require(&self, name: &str) -> Result<&'static str> {
        self.get(name)
            .ok_or_else(|| anyhow!("no embedded asset {name} in {}", self.dir))
    }

    /// Iterate over `(name, contents)` pairs.
    pub fn contents(&self) -> impl Iterator<Item = (&'static str, &'static str)> {
        self.files.iter().copied()
    }
}

/// Embed a list of asset files in the binary.
macro_rules! embed_assets {
    ($constname:ident, $dirname:literal, [ $($filename:literal),* ]) => {
        pub(crate) const $constname: $crate::assets::EmbeddedAssets = $crate::assets::EmbeddedAssets::new(
            concat!(env!("CARGO_MANIFEST_DIR"), "/", $dirname),
            &[$(
                (
                    $filename,
                    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/", $dirname, "/", $filename)),
                ),
            )*],
        );
    };
}

pub(crate) use embed_assets;

#[cfg(test)]
mod tests {
    use super::*;

    const FILES: EmbeddedAssets =
        EmbeddedAssets::new("test", &[("a.css", "body {}"), ("b.html", "<p>")]);

    #[test]
    fn lookup() {
        assert_eq!(FILES.get("a.css"), Some("body {}"));
        assert_eq!(FILES.get("b.html"), Some("<p>"));
        assert_eq!(FILES.get("c.js"), None);
    }

    #[test]
    fn require_missing() {
        let err = FILES.require("c.js").unwrap_err();
        assert_eq!(err.to_string(), "no embedded asset c.js in test");
    }

    #[test]
    fn all_contents() {
        let names: Vec<_> = FILES.contents().map(|(n, _)| n).collect();
        assert_eq!(names, ["a.css", "b.html"]);
    }
}
