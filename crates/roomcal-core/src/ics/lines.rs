//! Line splitting for raw feed text.

/// Iterator over the logical lines of a feed.
///
/// Lines end at `\r\n`, `\n` or a lone `\r`. A trailing terminator produces a
/// final empty line, and an empty input produces no lines at all.
#[derive(Debug, Clone)]
pub struct FeedLines<'a> {
    rest: Option<&'a str>,
}

impl<'a> FeedLines<'a> {
    /// Creates a line iterator over `text`.
    pub fn new(text: &'a str) -> Self {
        Self {
            rest: (!text.is_empty()).then_some(text),
        }
    }
}

impl<'a> Iterator for FeedLines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest?;

        match rest.find(['\r', '\n']) {
            Some(idx) => {
                let line = &rest[..idx];
                let after = &rest[idx..];
                let skip = if after.starts_with("\r\n") { 2 } else { 1 };
                self.rest = Some(&after[skip..]);
                Some(line)
            }
            None => {
                self.rest = None;
                Some(rest)
            }
        }
    }
}

/// Splits feed text into lines.
pub fn split_lines(text: &str) -> FeedLines<'_> {
    FeedLines::new(text)
}
