use pulldown_cmark::{Alignment, CowStr, Event, Tag, TagEnd};
use serde_yaml::{Mapping, Value};
use std::collections::VecDeque;

/// A pulldown-cmark adapter that replaces a YAML front matter block with a
/// one-row table: keys in the head, values in the body.
///
/// Front matter that isn't a YAML mapping is dropped with a warning.
pub struct FrontMatterTable<'a, I>
where
    I: Iterator<Item = Event<'a>>,
{
    iter: I,
    buffer: VecDeque<Event<'a>>,
}

impl<'a, I> FrontMatterTable<'a, I>
where
    I: Iterator<Item = Event<'a>>,
{
    pub fn new(iter: I) -> Self {
        Self {
            iter,
            buffer: VecDeque::new(),
        }
    }

    /// Consume the rest of a metadata block and return its raw text.
    fn consume_block(&mut self) -> String {
        let mut text = String::new();
        for event in self.iter.by_ref() {
            match event {
                Event::End(TagEnd::MetadataBlock(_)) => break,
                Event::Text(s) => text.push_str(&s),
                _ => (),
            }
        }
        text
    }

    fn push_table(&mut self, meta: &Mapping) {
        let cell = |value: &Value| {
            [
                Event::Start(Tag::TableCell),
                Event::Text(CowStr::from(format_value(value))),
                Event::End(TagEnd::TableCell),
            ]
        };

        self.buffer
            .push_back(Event::Start(Tag::Table(vec![Alignment::None; meta.len()])));
        self.buffer.push_back(Event::Start(Tag::TableHead));
        self.buffer.extend(meta.keys().flat_map(cell));
        self.buffer.push_back(Event::End(TagEnd::TableHead));
        self.buffer.push_back(Event::Start(Tag::TableRow));
        self.buffer.extend(meta.values().flat_map(cell));
        self.buffer.push_back(Event::End(TagEnd::TableRow));
        self.buffer.push_back(Event::End(TagEnd::Table));
    }
}

impl<'a, I> Iterator for FrontMatterTable<'a, I>
where
    I: Iterator<Item = Event<'a>>,
{
    type Item = Event<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.buffer.pop_front() {
                return Some(event);
            }

            match self.iter.next()? {
                Event::Start(Tag::MetadataBlock(_)) => {
                    let text = self.consume_block();
                    match serde_yaml::from_str::<Value>(&text) {
                        Ok(Value::Mapping(meta)) if !meta.is_empty() => self.push_table(&meta),
                        Ok(Value::Null) => (),
                        Ok(_) => tracing::warn!("front matter is not a mapping; dropping it"),
                        Err(e) => tracing::warn!(error = %e, "invalid front matter; dropping it"),
                    }
                }
                event => return Some(event),
            }
        }
    }
}

/// Show a YAML value in a table cell. Collections are flattened into
/// `[a b]` and `map[k:v]`.
fn format_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Sequence(items) => {
            let items: Vec<_> = items.iter().map(format_value).collect();
            format!("[{}]", items.join(" "))
        }
        Value::Mapping(map) => {
            let entries: Vec<_> = map
                .iter()
                .map(|(k, v)| format!("{}:{}", format_value(k), format_value(v)))
                .collect();
            format!("map[{}]", entries.join(" "))
        }
        Value::Tagged(tagged) => format_value(&tagged.value),
    }
}
