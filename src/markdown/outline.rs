use super::slug::SlugRegistry;
use regex::Regex;
use std::io::{self, BufRead, Write};

/// One entry in a document outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: usize,
    pub title: String,
    pub id: String,
}

impl Heading {
    /// Write this heading as a Markdown list item linking to `base_url#id`,
    /// indented four spaces per level below the top. Returns the number of
    /// bytes written.
    pub fn write_to<W: Write>(&self, base_url: &str, w: &mut W) -> io::Result<usize> {
        let indent = "    ".repeat(self.level.saturating_sub(1));
        let entry = format!("{indent}- [{}]({base_url}#{})", self.title, self.id);
        w.write_all(entry.as_bytes())?;
        Ok(entry.len())
    }
}

/// Write a nested Markdown bullet list for `headings`, ending every entry
/// with `newline`.
pub fn write_outline<W: Write>(
    headings: &[Heading],
    base_url: &str,
    newline: &str,
    w: &mut W,
) -> io::Result<usize> {
    let mut n = 0;
    for heading in headings {
        n += heading.write_to(base_url, w)?;
        w.write_all(newline.as_bytes())?;
        n += newline.len();
    }
    Ok(n)
}

/// A line-oriented heading finder for raw Markdown.
///
/// This is deliberately not a Markdown parser. It recognizes ATX headings
/// (`## Title`) and Setext headings (a title line underlined with `====` or
/// `----`) and skips anything between fence lines. A Setext underline only
/// counts when the line two back is blank, which keeps table separators and
/// horizontal rules in running text from turning into headings.
pub struct HeadingScanner {
    atx: Regex,
    setext1: Regex,
    setext2: Regex,
    fence: Regex,
}

impl Default for HeadingScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadingScanner {
    pub fn new() -> Self {
        Self {
            // Only ASCII blanks count as separators, as in CommonMark.
            atx: Regex::new(r"^(#+)[ \t]+").expect("valid ATX pattern"),
            setext1: Regex::new(r"^={4,}[ \t]*$").expect("valid underline pattern"),
            setext2: Regex::new(r"^-{4,}[ \t]*$").expect("valid underline pattern"),
            fence: Regex::new(r"^[ \t]*```").expect("valid fence pattern"),
        }
    }

    /// Collect the headings of a document, in order, with ids unique within
    /// this document.
    pub fn scan<R: BufRead>(&self, reader: R) -> io::Result<Vec<Heading>> {
        let mut slugs = SlugRegistry::new();
        let mut headings = vec![];
        let mut in_fence = false;
        let mut last = String::new();
        let mut lastlast = String::new();

        for line in reader.split(b'\n') {
            let mut line = line?;
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line).into_owned();

            if self.fence.is_match(&line) {
                in_fence = !in_fence;
            } else if !in_fence
                && let Some((level, title)) = self.detect(&line, &last, &lastlast)
            {
                let id = slugs.make(&title);
                headings.push(Heading { level, title, id });
            }

            lastlast = last;
            last = line;
        }

        tracing::debug!(count = headings.len(), "scanned outline");
        Ok(headings)
    }

    /// Scan an in-memory document.
    pub fn scan_str(&self, source: &str) -> Vec<Heading> {
        // Reading from a byte slice cannot fail.
        self.scan(source.as_bytes()).unwrap_or_default()
    }

    /// Check one (non-fence) line for a heading, given the two lines before
    /// it. Returns the level and title.
    fn detect(&self, line: &str, last: &str, lastlast: &str) -> Option<(usize, String)> {
        if let Some(m) = self.atx.captures(line) {
            let level = m[1].len();
            let title = line[m[0].len()..].trim().to_string();
            return Some((level, title));
        }
        if !lastlast.trim().is_empty() {
            return None;
        }
        if self.setext1.is_match(line) {
            Some((1, last.to_string()))
        } else if self.setext2.is_match(line) {
            Some((2, last.to_string()))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(level: usize, title: &str, id: &str) -> Heading {
        Heading {
            level,
            title: title.to_string(),
            id: id.to_string(),
        }
    }

    fn get_outline(source: &str) -> Vec<Heading> {
        HeadingScanner::new().scan_str(source)
    }

    #[test]
    fn no_headings() {
        assert_eq!(get_outline("hi\nthere"), &[]);
    }

    #[test]
    fn mixed_styles() {
        let source = "SQL-Bless\n=========\n\nSub Section\n-----------\n\n### Third level\n";
        assert_eq!(
            get_outline(source),
            &[
                heading(1, "SQL-Bless", "sql-bless"),
                heading(2, "Sub Section", "sub-section"),
                heading(3, "Third level", "third-level"),
            ]
        );
    }

    #[test]
    fn japanese_titles() {
        let source = "\nSQL-Bless\n=========\n\nサポートコマンド\n---------------\n\n### scoop インストーラーを使用する場合\n";
        let outline = get_outline(source);
        assert_eq!(outline.len(), 3);
        assert_eq!(outline[1].title, "サポートコマンド");
        assert_eq!(
            outline[1].id,
            "%E3%82%B5%E3%83%9D%E3%83%BC%E3%83%88%E3%82%B3%E3%83%9E%E3%83%B3%E3%83%89"
        );
        assert_eq!(outline[2].level, 3);
        assert!(outline[2].id.starts_with("scoop-%E3%82%A4"));
    }

    #[test]
    fn atx_trims_title() {
        assert_eq!(
            get_outline("##   Spaced out  \n"),
            &[heading(2, "Spaced out", "spaced-out")]
        );
    }

    #[test]
    fn atx_needs_space() {
        assert_eq!(get_outline("#hashtag\n"), &[]);
    }

    #[test]
    fn atx_needs_ascii_blank() {
        assert_eq!(
            get_outline("#\u{3000}見出し\n\n# Real\n"),
            &[heading(1, "Real", "real")]
        );
    }

    #[test]
    fn underline_with_ideographic_space() {
        assert_eq!(get_outline("Title\n=====\u{3000}\n"), &[]);
    }

    #[test]
    fn repeated_titles() {
        assert_eq!(
            get_outline("# Notes\n\n## Notes\n"),
            &[heading(1, "Notes", "notes"), heading(2, "Notes", "notes-0")]
        );
    }

    #[test]
    fn fenced_code_is_skipped() {
        let source = "# Real\n\n```sh\n# comment\n```\n\n  ```\n## also hidden\n  ```\n## After\n";
        assert_eq!(
            get_outline(source),
            &[heading(1, "Real", "real"), heading(2, "After", "after")]
        );
    }

    #[test]
    fn unterminated_fence_hides_the_rest() {
        assert_eq!(get_outline("```\n# nope\n"), &[]);
    }

    #[test]
    fn table_separator_is_not_a_heading() {
        let source = "text\n| a | b |\n----|----\n| 1 | 2 |\n";
        assert_eq!(get_outline(source), &[]);
    }

    #[test]
    fn rule_after_running_text_is_not_a_heading() {
        assert_eq!(get_outline("one\ntwo\n----\n"), &[]);
    }

    #[test]
    fn short_underline_is_not_a_heading() {
        assert_eq!(get_outline("Title\n===\n"), &[]);
    }

    #[test]
    fn setext_requires_blank_two_back() {
        let source = "para\nTitle\n=====\n\nOther\n-----\n";
        assert_eq!(get_outline(source), &[heading(2, "Other", "other")]);
    }

    #[test]
    fn crlf_lines() {
        assert_eq!(
            get_outline("Title\r\n=====\r\n\r\n# Next\r\n"),
            &[heading(1, "Title", "title"), heading(1, "Next", "next")]
        );
    }

    #[test]
    fn read_errors_propagate() {
        struct Broken;
        impl io::Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("boom"))
            }
        }
        let err = HeadingScanner::new()
            .scan(io::BufReader::new(Broken))
            .unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn outline_list() {
        let headings = [
            heading(1, "Top", "top"),
            heading(3, "Deep", "deep"),
            heading(2, "Mid", "mid"),
        ];
        let mut buf = vec![];
        let n = write_outline(&headings, "", "\n", &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "- [Top](#top)\n        - [Deep](#deep)\n    - [Mid](#mid)\n"
        );
        assert_eq!(n, text.len());
    }

    #[test]
    fn outline_base_url() {
        let mut buf = vec![];
        heading(2, "X", "x").write_to("page.html", &mut buf).unwrap();
        assert_eq!(buf, b"    - [X](page.html#x)");
    }
}
