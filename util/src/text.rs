use std::iter;

pub trait StrExt {
    /// Split text at whitespace so it fits within `max_width`.
    ///
    /// Words that are longer than `max_width` will be sliced into `max_width`
    /// sized segments.
    fn split_fitting(&self, max_width: usize) -> (&str, &str);

    /// Iterate over lines of text that fit within `max_width`.
    fn lines_of(&self, max_width: usize) -> impl Iterator<Item = &str>;
}

impl StrExt for str {
    fn split_fitting(&self, max_width: usize) -> (&str, &str) {
        // Can't consume anything if width is zero.
        assert!(max_width > 0);

        // Text fits in a single line and has no newlines, return as is.
        if self.chars().count() <= max_width && !self.chars().any(|c| c == '\n')
        {
            return (self, "");
        }

        // Position of end of text that fits in split-off line.
        let mut line_end = None;

        // Set to true in case line starts with whitespace
        let mut traversing_whitespace = true;
        for (i, (pos, c)) in self.char_indices().enumerate() {
            // Always break when you see newline.
            if c == '\n' {
                line_end = Some(pos);
                break;
            }

            if i >= max_width && !c.is_whitespace() {
                if line_end.is_none() {
                    // We hit max width but have no candidate prefix.
                    // No choice but to cut the string mid-word.
                    line_end = Some(pos);
                }
                break;
            }

            if i > 0 && c.is_whitespace() && !traversing_whitespace {
                // Mark the point where we first enter whitespace. (Use
                // traversing_whitespace flag to not update line_end at subsequent
                // whitespace chars.)
                line_end = Some(pos);
                traversing_whitespace = true;
            }
            if !c.is_whitespace() {
                traversing_whitespace = false;
            }
        }

        let line_end = match line_end {
            None => self.len(),
            Some(n) => n,
        };

        // Cut off the whitespace in between split lines.
        // Start with the assumption that the whole remaining string is
        // whitespace, truncate in the loop.
        let mut whitespace_span = self[line_end..].len();
        for (i, c) in self[line_end..].char_indices() {
            // Stop cutting right past first newline you see.
            if c == '\n' {
                whitespace_span = i + 1;
                break;
            }
            // Otherwise cut when you see non-whitespace again
            if !c.is_whitespace() {
                whitespace_span = i;
                break;
            }
        }

        (&self[..line_end], &self[(line_end + whitespace_span)..])
    }

    fn lines_of(&self, max_width: usize) -> impl Iterator<Item = &str> {
        let mut text = self;
        iter::from_fn(move || {
            if text.is_empty() {
                None
            } else {
                let (line, rest) = text.split_fitting(max_width);
                text = rest;
                Some(line)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines() {
        let text = "The blob hits you for 2.5 damage";
        let lines: Vec<&str> = text.lines_of(12).collect();
        assert_eq!(lines, vec!["The blob", "hits you for", "2.5 damage"]);

        let lines: Vec<&str> = "abcdefghij".lines_of(4).collect();
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }
}
