//! Recovers comments from YAML source text.
//!
//! The event parser drops comments, so they are matched back to nodes by line:
//! full-line comments above a key or sequence item become its head comment, a
//! trailing comment on its line becomes its line comment, and whatever is left
//! after the last node becomes the document foot.

/// Line-indexed view of a source text with a claim cursor.
pub(crate) struct SourceLines<'a> {
    lines: Vec<&'a str>,
    /// Char index at which each line starts.
    line_starts: Vec<usize>,
    /// Lines that belong to a block scalar body.
    opaque: Vec<bool>,
    /// Lines whose trailing comment has been handed out.
    claimed: Vec<bool>,
    /// First line not yet scanned for head comments.
    cursor: usize,
}

impl<'a> SourceLines<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        let lines: Vec<&str> = source.split('\n').collect();
        let mut line_starts = Vec::with_capacity(lines.len());
        let mut start = 0;
        for line in &lines {
            line_starts.push(start);
            start += line.chars().count() + 1;
        }
        let count = lines.len();
        Self {
            lines,
            line_starts,
            opaque: vec![false; count],
            claimed: vec![false; count],
            cursor: 0,
        }
    }

    /// Line number (0-based) of a char index.
    pub(crate) fn line_of(&self, char_index: usize) -> usize {
        self.line_starts
            .partition_point(|&start| start <= char_index)
            .saturating_sub(1)
    }

    /// Comment lines between the cursor and `line`, then move the cursor past `line`.
    pub(crate) fn take_head(&mut self, line: usize) -> Vec<String> {
        let end = line.min(self.lines.len());
        let mut head = Vec::new();
        for idx in self.cursor..end {
            if let Some(comment) = self.comment_line(idx) {
                head.push(comment);
            }
        }
        self.cursor = self.cursor.max(line + 1);
        head
    }

    /// Trailing comment of `line`, handed out at most once.
    pub(crate) fn take_line_comment(&mut self, line: usize) -> Option<String> {
        let claimed = self.claimed.get_mut(line)?;
        if *claimed {
            return None;
        }
        *claimed = true;
        trailing_comment(self.lines[line])
    }

    /// Mark the body of a block scalar whose header is on `line` so that `#`
    /// lines inside it are never read as comments.
    pub(crate) fn mark_block_scalar(&mut self, line: usize) {
        let Some(header) = self.lines.get(line) else {
            return;
        };
        let base = indent_of(header);
        for idx in line + 1..self.lines.len() {
            let text = self.lines[idx];
            if text.trim().is_empty() || indent_of(text) > base {
                self.opaque[idx] = true;
            } else {
                break;
            }
        }
    }

    /// All comment lines after the cursor.
    pub(crate) fn take_foot(&mut self) -> Vec<String> {
        let foot = (self.cursor..self.lines.len())
            .filter_map(|idx| self.comment_line(idx))
            .collect();
        self.cursor = self.lines.len();
        foot
    }

    fn comment_line(&self, idx: usize) -> Option<String> {
        if self.opaque[idx] {
            return None;
        }
        let trimmed = self.lines[idx].trim();
        trimmed.starts_with('#').then(|| trimmed.to_string())
    }
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// The `# ...` tail of a content line, ignoring `#` inside quoted scalars.
pub(crate) fn trailing_comment(line: &str) -> Option<String> {
    let mut quote: Option<char> = None;
    let mut prev = ' ';
    let mut chars = line.char_indices().peekable();
    while let Some((pos, c)) = chars.next() {
        match quote {
            Some('"') if c == '\\' => {
                chars.next();
            }
            Some('\'') if c == '\'' && chars.peek().map(|&(_, n)| n) == Some('\'') => {
                chars.next();
            }
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if (c == '"' || c == '\'') && token_start(prev) => quote = Some(c),
            None if c == '#' && prev.is_whitespace() && pos > 0 => {
                return Some(line[pos..].trim_end().to_string());
            }
            None => {}
        }
        prev = c;
    }
    None
}

fn token_start(prev: char) -> bool {
    prev.is_whitespace() || matches!(prev, '[' | '{' | ',' | ':' | '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("key: value # note", Some("# note"))]
    #[case("key: value", None)]
    #[case("key: \"a # b\" # real", Some("# real"))]
    #[case("key: 'it''s # here'", None)]
    #[case("url: http://x#frag", None)]
    #[case("- item   # trailing  ", Some("# trailing"))]
    fn given_content_line_when_scanning_then_finds_trailing_comment(
        #[case] line: &str,
        #[case] expected: Option<&str>,
    ) {
        assert_eq!(trailing_comment(line).as_deref(), expected);
    }

    #[test]
    fn given_block_scalar_when_marking_then_hash_lines_inside_are_not_comments() {
        let source = "text: |\n  # not a comment\n  body\n# real\nnext: 1\n";
        let mut lines = SourceLines::new(source);

        lines.mark_block_scalar(0);
        let head = lines.take_head(4);

        assert_eq!(head, vec!["# real".to_string()]);
    }

    #[test]
    fn given_char_index_when_locating_then_returns_line() {
        let lines = SourceLines::new("a: 1\nbb: 2\n");
        assert_eq!(lines.line_of(0), 0);
        assert_eq!(lines.line_of(5), 1);
        assert_eq!(lines.line_of(7), 1);
    }
}
