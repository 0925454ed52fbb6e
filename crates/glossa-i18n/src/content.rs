//! Translated content: single-line texts and multi-line messages.
//!
//! Both are immutable and cheap to clone. Replacement always returns a new
//! value and leaves the receiver untouched.

use std::fmt;
use std::sync::Arc;

/// Discriminant of [`Content`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentKind {
    /// A single string.
    Text,
    /// An ordered list of lines.
    Message,
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Message => f.write_str("message"),
        }
    }
}

/// Ordered set of placeholder substitutions.
///
/// Placeholders are stored wrapped in braces: `set("name", ..)` and
/// `set("{name}", ..)` target the same `{name}` marker. Setting a placeholder
/// again overwrites its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Replacer {
    replacements: Vec<(String, String)>,
}

impl Replacer {
    /// Creates an empty replacer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or overwrites a substitution. Empty placeholders are ignored.
    #[must_use]
    pub fn set(mut self, placeholder: &str, value: impl fmt::Display) -> Self {
        if placeholder.is_empty() {
            return self;
        }
        let placeholder = if placeholder.starts_with('{') && placeholder.ends_with('}') {
            placeholder.to_owned()
        } else {
            format!("{{{placeholder}}}")
        };
        let value = value.to_string();

        match self.replacements.iter_mut().find(|(p, _)| *p == placeholder) {
            Some(entry) => entry.1 = value,
            None => self.replacements.push((placeholder, value)),
        }
        self
    }

    /// Substitutions in application order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.replacements.iter().map(|(p, v)| (p.as_str(), v.as_str()))
    }

    /// Number of substitutions.
    pub fn len(&self) -> usize {
        self.replacements.len()
    }

    /// Whether no substitution is set.
    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }

    fn apply(&self, line: &str) -> Option<String> {
        let mut current: Option<String> = None;
        for (placeholder, value) in self.iter() {
            if let Some(replaced) = replace_line(current.as_deref().unwrap_or(line), placeholder, value) {
                current = Some(replaced);
            }
        }
        current
    }
}

/// Returns `None` when nothing would change.
fn replace_line(line: &str, field: &str, value: &str) -> Option<String> {
    if field.is_empty() || value.is_empty() || !line.contains(field) {
        return None;
    }
    Some(line.replace(field, value))
}

/// A single translated string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Text(Arc<str>);

impl Text {
    /// Wraps `text`.
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self(text.into())
    }

    /// The translated string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Replaces every occurrence of `field` with `value`.
    ///
    /// An empty `field` or `value` leaves the text as is.
    #[must_use]
    pub fn replace(&self, field: &str, value: &str) -> Self {
        replace_line(&self.0, field, value).map_or_else(|| self.clone(), Self::new)
    }

    /// Applies every substitution of `replacer`, left to right.
    #[must_use]
    pub fn replace_all(&self, replacer: &Replacer) -> Self {
        replacer.apply(&self.0).map_or_else(|| self.clone(), Self::new)
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Text {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Text {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Text {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// An ordered list of translated lines.
///
/// Replacement shares the lines it does not touch with the original.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Message(Arc<[Arc<str>]>);

impl Message {
    /// Builds a message from its lines.
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        Self(lines.into_iter().map(Into::into).collect())
    }

    /// Lines in order.
    pub fn lines(&self) -> impl ExactSizeIterator<Item = &str> {
        self.0.iter().map(|line| &**line)
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the message has no lines.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copies the lines out.
    pub fn to_strings(&self) -> Vec<String> {
        self.lines().map(str::to_owned).collect()
    }

    /// Replaces every occurrence of `field` with `value` in every line.
    ///
    /// An empty `field` or `value` leaves the message as is.
    #[must_use]
    pub fn replace(&self, field: &str, value: &str) -> Self {
        self.map_lines(|line| replace_line(line, field, value))
    }

    /// Applies every substitution of `replacer` to every line, left to right.
    #[must_use]
    pub fn replace_all(&self, replacer: &Replacer) -> Self {
        self.map_lines(|line| replacer.apply(line))
    }

    fn map_lines(&self, mut f: impl FnMut(&str) -> Option<String>) -> Self {
        let mut changed = false;
        let lines: Arc<[Arc<str>]> = self
            .0
            .iter()
            .map(|line| match f(line) {
                Some(replaced) => {
                    changed = true;
                    Arc::from(replaced)
                }
                None => Arc::clone(line),
            })
            .collect();

        if changed {
            Self(lines)
        } else {
            self.clone()
        }
    }

    #[cfg(test)]
    fn line_handle(&self, index: usize) -> &Arc<str> {
        &self.0[index]
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}

impl From<Vec<String>> for Message {
    fn from(lines: Vec<String>) -> Self {
        Self::new(lines)
    }
}

impl From<&[&str]> for Message {
    fn from(lines: &[&str]) -> Self {
        Self::new(lines.iter().copied())
    }
}

/// Either kind of translated content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Content {
    /// A single string.
    Text(Text),
    /// An ordered list of lines.
    Message(Message),
}

impl Content {
    /// Which variant this is.
    pub const fn kind(&self) -> ContentKind {
        match self {
            Self::Text(_) => ContentKind::Text,
            Self::Message(_) => ContentKind::Message,
        }
    }

    /// The text, if this is one.
    pub fn into_text(self) -> Option<Text> {
        match self {
            Self::Text(text) => Some(text),
            Self::Message(_) => None,
        }
    }

    /// The message, if this is one.
    pub fn into_message(self) -> Option<Message> {
        match self {
            Self::Message(message) => Some(message),
            Self::Text(_) => None,
        }
    }

    /// Applies `replacer` to whichever variant this is.
    #[must_use]
    pub fn replace_all(&self, replacer: &Replacer) -> Self {
        match self {
            Self::Text(text) => Self::Text(text.replace_all(replacer)),
            Self::Message(message) => Self::Message(message.replace_all(replacer)),
        }
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => fmt::Display::fmt(text, f),
            Self::Message(message) => fmt::Display::fmt(message, f),
        }
    }
}

impl From<Text> for Content {
    fn from(text: Text) -> Self {
        Self::Text(text)
    }
}

impl From<Message> for Content {
    fn from(message: Message) -> Self {
        Self::Message(message)
    }
}
