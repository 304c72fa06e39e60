use std::{
    fmt::Display,
    ops::{Range, RangeInclusive},
};

/// Byte offset into the expression text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceOffset(usize);

impl SourceOffset {
    pub fn byte_offset(&self) -> usize {
        self.0
    }
}

impl From<usize> for SourceOffset {
    fn from(offset: usize) -> Self {
        Self(offset)
    }
}

impl Display for SourceOffset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&SourceOffset> for miette::SourceOffset {
    fn from(offset: &SourceOffset) -> Self {
        offset.0.into()
    }
}
impl From<SourceOffset> for miette::SourceOffset {
    fn from(offset: SourceOffset) -> Self {
        Self::from(&offset)
    }
}
impl From<&SourceOffset> for miette::SourceSpan {
    fn from(offset: &SourceOffset) -> Self {
        Self::from(&SourceSpan::from(offset))
    }
}
impl From<SourceOffset> for miette::SourceSpan {
    fn from(offset: SourceOffset) -> Self {
        Self::from(&offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpan {
    offset: SourceOffset,
    length: usize,
}

impl SourceSpan {
    pub fn new(offset: SourceOffset, length: usize) -> Self {
        Self { offset, length }
    }
    /// Zero-width span, used for the end-of-input token.
    pub fn empty(offset: SourceOffset) -> Self {
        Self::new(offset, 0)
    }
    pub fn range(start: SourceOffset, end: SourceOffset) -> Self {
        Self {
            offset: start,
            length: end.0.saturating_sub(start.0),
        }
    }
    pub fn len(&self) -> usize {
        self.length
    }
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
    pub fn start(&self) -> SourceOffset {
        self.offset
    }
    pub fn end(&self) -> SourceOffset {
        (self.offset.0 + self.length).into()
    }
    pub fn to(&self, other: SourceSpan) -> Self {
        Self::range(self.start().min(other.start()), self.end().max(other.end()))
    }
}

impl From<&SourceOffset> for SourceSpan {
    fn from(offset: &SourceOffset) -> Self {
        Self::new(*offset, 1)
    }
}
impl From<SourceOffset> for SourceSpan {
    fn from(offset: SourceOffset) -> Self {
        Self::from(&offset)
    }
}

impl From<&SourceSpan> for miette::SourceSpan {
    fn from(span: &SourceSpan) -> Self {
        Self::new((&span.offset).into(), span.length.into())
    }
}
impl From<SourceSpan> for miette::SourceSpan {
    fn from(span: SourceSpan) -> Self {
        Self::from(&span)
    }
}

impl From<Range<usize>> for SourceSpan {
    fn from(range: Range<usize>) -> Self {
        Self::range(range.start.into(), range.end.into())
    }
}
impl From<RangeInclusive<usize>> for SourceSpan {
    fn from(range: RangeInclusive<usize>) -> Self {
        Self::range((*range.start()).into(), (*range.end() + 1).into())
    }
}

impl From<usize> for SourceSpan {
    fn from(offset: usize) -> Self {
        Self::new(offset.into(), 1)
    }
}
