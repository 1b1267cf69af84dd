//! Dot/bracket key paths.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Errors related to key path parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// A key segment was empty (`a..b`, trailing `.`).
    #[error("empty key in path at position {position}")]
    EmptyKey { position: usize },

    /// A `[` without a matching `]`.
    #[error("unclosed bracket starting at position {position}")]
    UnclosedBracket { position: usize },

    /// The text between brackets is not a non-negative integer.
    #[error("invalid array index '{text}' at position {position}")]
    InvalidIndex { position: usize, text: String },

    /// A character that cannot appear where it was found.
    #[error("unexpected character '{found}' at position {position}")]
    UnexpectedChar { found: char, position: usize },

    /// The operation needs at least one segment.
    #[error("operation requires a non-root path")]
    RootNotAllowed,
}

/// One step of a key path.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Segment {
    /// Mapping key: `name` in `user.name`.
    Key(String),
    /// Numeric index: `2` in `items[2]`.
    Index(usize),
}

impl Segment {
    /// The mapping key this segment addresses when applied to an object.
    ///
    /// Index segments address numeric-string keys, so `a[0]` and `a.0` reach
    /// the same entry of an object.
    pub fn as_key(&self) -> Cow<'_, str> {
        match self {
            Segment::Key(k) => Cow::Borrowed(k.as_str()),
            Segment::Index(i) => Cow::Owned(i.to_string()),
        }
    }

    /// The array index this segment addresses when applied to an array.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Key(_) => None,
            Segment::Index(i) => Some(*i),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => write!(f, "{}", k),
            Segment::Index(i) => write!(f, "[{}]", i),
        }
    }
}

/// A parsed key path such as `users[0].name`.
///
/// The empty path is the root of the store.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct KeyPath {
    segments: Vec<Segment>,
}

impl KeyPath {
    /// The root path.
    pub fn root() -> Self {
        KeyPath {
            segments: Vec::new(),
        }
    }

    /// Build a path from already-typed segments.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        KeyPath { segments }
    }

    /// Parse a key path string.
    ///
    /// # Path Syntax
    ///
    /// - `.` separates mapping keys
    /// - `[n]` indexes into a sequence
    /// - A single leading `.` is ignored
    /// - Keys may contain anything except `.`, `[` and `]`
    ///
    /// # Examples
    ///
    /// ```rust
    /// use dotstore_core::{KeyPath, Segment};
    ///
    /// let path = KeyPath::parse("items[2].name").unwrap();
    /// assert_eq!(path.len(), 3);
    /// assert_eq!(path.segments()[1], Segment::Index(2));
    ///
    /// assert!(KeyPath::parse("a..b").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let bytes = s.as_bytes();
        let len = bytes.len();
        let mut segments = Vec::new();

        let mut i = 0;
        let mut after_dot = false;
        if s.starts_with('.') {
            i = 1;
            after_dot = true;
        }

        while i < len {
            match bytes[i] {
                b'[' if !after_dot => {
                    let close = s[i + 1..]
                        .find(']')
                        .ok_or(PathError::UnclosedBracket { position: i })?;
                    let text = &s[i + 1..i + 1 + close];
                    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
                        return Err(PathError::InvalidIndex {
                            position: i + 1,
                            text: text.to_string(),
                        });
                    }
                    let index = text.parse::<usize>().map_err(|_| PathError::InvalidIndex {
                        position: i + 1,
                        text: text.to_string(),
                    })?;
                    segments.push(Segment::Index(index));
                    i += close + 2;
                }
                b']' => {
                    return Err(PathError::UnexpectedChar {
                        found: ']',
                        position: i,
                    });
                }
                b'.' | b'[' => return Err(PathError::EmptyKey { position: i }),
                _ => {
                    let end = s[i..]
                        .find(['.', '[', ']'])
                        .map(|offset| i + offset)
                        .unwrap_or(len);
                    segments.push(Segment::Key(s[i..end].to_string()));
                    i = end;
                }
            }
            after_dot = false;

            if i < len {
                match bytes[i] {
                    b'.' => {
                        i += 1;
                        after_dot = true;
                    }
                    b'[' => {}
                    _ => {
                        let found = s[i..].chars().next().unwrap_or(']');
                        return Err(PathError::UnexpectedChar { found, position: i });
                    }
                }
            }
        }

        if after_dot {
            return Err(PathError::EmptyKey { position: len });
        }

        Ok(KeyPath { segments })
    }

    /// Append a key segment.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(Segment::Key(key.into()));
        self
    }

    /// Append an index segment.
    #[must_use]
    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(Segment::Index(index));
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn iter(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if this is the root path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Split into the parent segments and the final segment.
    ///
    /// Returns `None` for the root path.
    pub fn split_last(&self) -> Option<(&[Segment], &Segment)> {
        self.segments
            .split_last()
            .map(|(last, parent)| (parent, last))
    }

    /// The path of the containing value, or `None` at the root.
    pub fn parent(&self) -> Option<KeyPath> {
        self.split_last().map(|(parent, _)| KeyPath {
            segments: parent.to_vec(),
        })
    }

    /// Join this path with another.
    #[must_use]
    pub fn join(&self, other: &KeyPath) -> KeyPath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        KeyPath { segments }
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 && matches!(segment, Segment::Key(_)) {
                write!(f, ".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for KeyPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyPath::parse(s)
    }
}

impl TryFrom<&str> for KeyPath {
    type Error = PathError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        KeyPath::parse(s)
    }
}

impl std::ops::Index<usize> for KeyPath {
    type Output = Segment;

    fn index(&self, i: usize) -> &Self::Output {
        &self.segments[i]
    }
}

/// Anything that can name a key path: parsed `KeyPath`s, or strings to parse.
pub trait ToKeyPath {
    fn to_key_path(&self) -> Result<Cow<'_, KeyPath>, PathError>;
}

impl ToKeyPath for KeyPath {
    fn to_key_path(&self) -> Result<Cow<'_, KeyPath>, PathError> {
        Ok(Cow::Borrowed(self))
    }
}

impl ToKeyPath for str {
    fn to_key_path(&self) -> Result<Cow<'_, KeyPath>, PathError> {
        KeyPath::parse(self).map(Cow::Owned)
    }
}

impl ToKeyPath for String {
    fn to_key_path(&self) -> Result<Cow<'_, KeyPath>, PathError> {
        self.as_str().to_key_path()
    }
}

/// Macro for creating paths from literals.
///
/// # Example
///
/// ```rust
/// use dotstore_core::path;
///
/// let p = path!("users[3].name");
/// assert_eq!(p.len(), 3);
/// ```
#[macro_export]
macro_rules! path {
    ($s:expr) => {
        $crate::KeyPath::parse($s).expect("invalid path literal")
    };
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn segment() -> impl Strategy<Value = Segment> {
        prop_oneof![
            "[^.\\[\\]]{1,8}".prop_map(Segment::Key),
            (0usize..1000).prop_map(Segment::Index),
        ]
    }

    proptest! {
        /// Any typed path prints to a string that parses back to it.
        #[test]
        fn prop_display_parses_back(segments in proptest::collection::vec(segment(), 0..6)) {
            let path = KeyPath::from_segments(segments);
            let reparsed = KeyPath::parse(&path.to_string()).unwrap();
            prop_assert_eq!(reparsed, path);
        }

        /// Parsing never panics, whatever the input.
        #[test]
        fn prop_parse_total(s in ".*") {
            let _ = KeyPath::parse(&s);
        }
    }
}
