use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::collections::HashMap;
use unicode_general_category::{GeneralCategory, get_general_category};

/// Characters left alone when escaping a path segment: the RFC 3986
/// unreserved set. Everything else, including all non-ASCII bytes, is escaped.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Turn a heading title into its base slug: lower-cased, with whitespace
/// turned into hyphens, anything other than letters, digits, `-` and `_`
/// dropped, hyphen runs collapsed, and hyphens trimmed from both ends.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_is_dash = false;
    for c in title.to_lowercase().chars() {
        let c = if c.is_whitespace() { '-' } else { c };
        if c == '-' {
            if !last_is_dash {
                slug.push('-');
            }
            last_is_dash = true;
        } else if is_letter_or_number(c) || c == '_' {
            slug.push(c);
            last_is_dash = false;
        }
    }
    slug.trim_matches('-').to_string()
}

/// Letters and numbers by general category (L* and N*). Combining marks are
/// not letters, even though they count as alphabetic.
fn is_letter_or_number(c: char) -> bool {
    use GeneralCategory::*;
    matches!(
        get_general_category(c),
        UppercaseLetter
            | LowercaseLetter
            | TitlecaseLetter
            | ModifierLetter
            | OtherLetter
            | DecimalNumber
            | LetterNumber
            | OtherNumber
    )
}

/// Hands out unique anchor ids for the headings of one document.
///
/// The first heading with a given slug gets the slug itself; later ones get
/// `-0`, `-1`, and so on appended.
#[derive(Debug, Default)]
pub struct SlugRegistry {
    used: HashMap<String, usize>,
}

impl SlugRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a fresh, percent-escaped id for `title`.
    pub fn make(&mut self, title: &str) -> String {
        let base = slugify(title);
        let slug = match self.used.get_mut(&base) {
            Some(count) => {
                let suffixed = format!("{base}-{count}");
                *count += 1;
                suffixed
            }
            None => {
                let slug = base.clone();
                self.used.insert(base, 1);
                slug
            }
        };
        utf8_percent_encode(&slug, PATH_SEGMENT).to_string()
    }
}
