use super::slug::SlugRegistry;
use pulldown_cmark::{CowStr, Event, LinkType, Tag, TagEnd};
use std::collections::VecDeque;

/// A pulldown-cmark adapter that adds IDs to headings that don't already have
/// them, drawing them from a [`SlugRegistry`] so they agree with the ids an
/// outline scan of the same source produces.
///
/// With an anchor text, every heading also gets a link to itself appended.
pub struct AddHeadingIds<'a, 'b, I>
where
    I: Iterator<Item = Event<'a>>,
{
    iter: I,
    slugs: &'b mut SlugRegistry,
    anchor_text: Option<&'b str>,
    buffer: VecDeque<Event<'a>>,
}

impl<'a, 'b, I> AddHeadingIds<'a, 'b, I>
where
    I: Iterator<Item = Event<'a>>,
{
    pub fn new(iter: I, slugs: &'b mut SlugRegistry, anchor_text: Option<&'b str>) -> Self {
        Self {
            iter,
            slugs,
            anchor_text,
            buffer: VecDeque::new(),
        }
    }

    /// Assuming that `self` is now just after the beginning of a heading,
    /// buffer up all the events until the end of the heading in
    /// `self.buffer`. Return the heading's plain text.
    fn consume_heading(&mut self) -> String {
        debug_assert!(self.buffer.is_empty(), "nested headings are not allowed");
        let mut text = String::new();

        for future_event in self.iter.by_ref() {
            let is_end = match &future_event {
                Event::End(TagEnd::Heading(_)) => true,
                Event::Text(s) | Event::Code(s) => {
                    text.push_str(s);
                    false
                }
                _ => false,
            };
            self.buffer.push_back(future_event);
            if is_end {
                break;
            }
        }

        text
    }

    /// Slip a self-link in just before the buffered end of the heading.
    fn push_anchor(&mut self, id: &str, anchor_text: &'b str) {
        let end = self.buffer.pop_back();
        self.buffer.extend([
            Event::Text(" ".into()),
            Event::Start(Tag::Link {
                link_type: LinkType::Inline,
                dest_url: format!("#{id}").into(),
                title: CowStr::Borrowed(""),
                id: CowStr::Borrowed(""),
            }),
            Event::Text(anchor_text.to_string().into()),
            Event::End(TagEnd::Link),
        ]);
        self.buffer.extend(end);
    }
}

impl<'a, 'b, I> Iterator for AddHeadingIds<'a, 'b, I>
where
    I: Iterator<Item = Event<'a>>,
{
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        // Unbuffer the next buffered event, if any.
        if let Some(event) = self.buffer.pop_front() {
            return Some(event);
        }

        let event = self.iter.next()?;
        match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                let text = self.consume_heading();
                let id = match id {
                    Some(id) => id,
                    None => CowStr::from(self.slugs.make(&text)),
                };
                if let Some(anchor_text) = self.anchor_text {
                    self.push_anchor(&id, anchor_text);
                }
                Some(Event::Start(Tag::Heading {
                    level,
                    id: Some(id),
                    classes,
                    attrs,
                }))
            }
            _ => Some(event),
        }
    }
}
