use std::fmt;

/// Text bounded by a declared maximum length, as stored in `char`/`varchar`
/// columns.
///
/// Construction truncates to `max_length` characters; shorter values are
/// never padded.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CharString {
    value: String,
    max_length: u32,
}

impl CharString {
    /// Wraps `value`, truncating it to `max_length` characters.
    pub fn new(value: impl Into<String>, max_length: u32) -> Self {
        let mut value = value.into();
        if let Some((byte_idx, _)) = value.char_indices().nth(max_length as usize) {
            value.truncate(byte_idx);
        }
        Self { value, max_length }
    }

    /// The (possibly truncated) text.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The declared maximum length.
    #[must_use]
    pub fn max_length(&self) -> u32 {
        self.max_length
    }

    /// Unwraps the text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.value
    }
}

impl fmt::Display for CharString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::CharString;

    #[test]
    fn truncates_by_characters() {
        assert_eq!(CharString::new("abcdef", 3).value(), "abc");
        assert_eq!(CharString::new("ab", 3).value(), "ab");
        assert_eq!(CharString::new("héllo", 2).value(), "hé");
    }
}
