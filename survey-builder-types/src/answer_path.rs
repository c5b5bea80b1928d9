use std::fmt;
use std::str::FromStr;

/// A single segment of an [`AnswerPath`].
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    /// Object key, e.g. the field name `asset_count`.
    Key(String),
    /// Position inside a dynamic panel's answer array.
    Index(usize),
}

/// A path to an answer value, e.g. `household_members[1].asset_count`.
///
/// Top-level fields are single-key paths. Answers inside a dynamic panel are
/// addressed through the panel name, the panel instance index and the
/// template field name.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnswerPath {
    segments: Vec<Segment>,
}

/// Error returned when a textual path cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathParseError {
    #[error("empty path segment in '{0}'")]
    EmptySegment(String),

    #[error("unterminated index in '{0}'")]
    UnterminatedIndex(String),

    #[error("invalid index '{index}' in '{path}'")]
    InvalidIndex { path: String, index: String },
}

impl AnswerPath {
    /// Create a path addressing a top-level field.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Key(name.into())],
        }
    }

    /// Create an empty path (the answer object itself).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse the dotted/bracketed textual form.
    pub fn parse(path: &str) -> Result<Self, PathParseError> {
        let mut segments = Vec::new();
        if path.is_empty() {
            return Ok(Self { segments });
        }

        for part in path.split('.') {
            let (key, mut rest) = match part.find('[') {
                Some(pos) => (&part[..pos], &part[pos..]),
                None => (part, ""),
            };
            if key.is_empty() {
                return Err(PathParseError::EmptySegment(path.to_string()));
            }
            segments.push(Segment::Key(key.to_string()));

            while !rest.is_empty() {
                let Some(close) = rest.find(']') else {
                    return Err(PathParseError::UnterminatedIndex(path.to_string()));
                };
                let raw = &rest[1..close];
                let index = raw.parse().map_err(|_| PathParseError::InvalidIndex {
                    path: path.to_string(),
                    index: raw.to_string(),
                })?;
                segments.push(Segment::Index(index));
                rest = &rest[close + 1..];
                if !rest.is_empty() && !rest.starts_with('[') {
                    return Err(PathParseError::UnterminatedIndex(path.to_string()));
                }
            }
        }

        Ok(Self { segments })
    }

    /// Append a key segment, returning a new path.
    pub fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Key(name.to_string()));
        Self { segments }
    }

    /// Append an index segment, returning a new path.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True for paths naming a field directly on the page (no panel nesting).
    pub fn is_top_level(&self) -> bool {
        matches!(self.segments.as_slice(), [Segment::Key(_)])
    }

    /// The first key, i.e. the top-level field this path belongs to.
    pub fn first_key(&self) -> Option<&str> {
        match self.segments.first() {
            Some(Segment::Key(k)) => Some(k),
            _ => None,
        }
    }

    /// The last key segment, i.e. the field name the path ends in.
    pub fn last_key(&self) -> Option<&str> {
        match self.segments.last() {
            Some(Segment::Key(k)) => Some(k),
            _ => None,
        }
    }

    /// Parent path with the last segment removed.
    pub fn parent(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.pop();
        Self { segments }
    }

    /// The innermost dynamic panel instance enclosing this path.
    ///
    /// For `household_members[1].asset_count` this is
    /// `(household_members, 1)`. Returns `None` for top-level paths.
    pub fn panel_scope(&self) -> Option<(AnswerPath, usize)> {
        let cut = self
            .segments
            .iter()
            .rposition(|s| matches!(s, Segment::Index(_)))?;
        let Segment::Index(index) = self.segments[cut] else {
            return None;
        };
        Some((
            Self {
                segments: self.segments[..cut].to_vec(),
            },
            index,
        ))
    }

    /// Field names along the path, skipping panel indices.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Key(k) => Some(k.as_str()),
            Segment::Index(_) => None,
        })
    }
}

impl fmt::Display for AnswerPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(k) if i == 0 => write!(f, "{k}")?,
                Segment::Key(k) => write!(f, ".{k}")?,
                Segment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for AnswerPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<&str> for AnswerPath {
    /// Treats the whole string as a single field name.
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for AnswerPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_top_level() {
        let path = AnswerPath::parse("age").unwrap();
        assert!(path.is_top_level());
        assert_eq!(path.last_key(), Some("age"));
    }

    #[test]
    fn parse_nested_panel() {
        let path = AnswerPath::parse("household_members[1].asset_count").unwrap();
        assert_eq!(
            path.segments(),
            &[
                Segment::Key("household_members".into()),
                Segment::Index(1),
                Segment::Key("asset_count".into()),
            ]
        );
        assert_eq!(path.to_string(), "household_members[1].asset_count");
    }

    #[test]
    fn builders_match_parse() {
        let built = AnswerPath::new("household_members")
            .index(0)
            .child("member_assets")
            .index(2)
            .child("asset_name");
        let parsed = AnswerPath::parse("household_members[0].member_assets[2].asset_name").unwrap();
        assert_eq!(built, parsed);
    }

    #[test]
    fn panel_scope_is_innermost_instance() {
        let path = AnswerPath::parse("household_members[3].asset_count").unwrap();
        let (panel, index) = path.panel_scope().unwrap();
        assert_eq!(panel.to_string(), "household_members");
        assert_eq!(index, 3);

        assert!(AnswerPath::new("age").panel_scope().is_none());
    }

    #[test]
    fn parent_and_keys() {
        let path = AnswerPath::parse("a[0].b").unwrap();
        assert_eq!(path.parent().to_string(), "a[0]");
        assert_eq!(path.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn rejects_malformed() {
        assert!(matches!(
            AnswerPath::parse("a..b"),
            Err(PathParseError::EmptySegment(_))
        ));
        assert!(matches!(
            AnswerPath::parse("a[1"),
            Err(PathParseError::UnterminatedIndex(_))
        ));
        assert!(matches!(
            AnswerPath::parse("a[x]"),
            Err(PathParseError::InvalidIndex { .. })
        ));
    }
}
