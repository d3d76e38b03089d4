//! Rolling line buffers for subprocess output.

use std::collections::VecDeque;

/// Keeps the last N lines of a stream.
///
/// Blender is extremely chatty during a render; only the tail is useful
/// for diagnostics, so the rest is dropped as it arrives instead of being
/// buffered for the whole (potentially hour-long) run.
#[derive(Debug)]
pub struct TailBuffer {
    lines: VecDeque<String>,
    max_lines: usize,
}

impl TailBuffer {
    /// Create a buffer keeping at most `max_lines` lines.
    pub fn new(max_lines: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(max_lines),
            max_lines,
        }
    }

    /// Push a line, evicting the oldest when full.
    pub fn push(&mut self, line: String) {
        if self.lines.len() == self.max_lines {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Number of buffered lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Join the buffered lines back into a single string.
    pub fn join(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(line);
        }
        out
    }
}

/// Keep only the last `max_chars` characters of a string.
///
/// Used to cap the stdout excerpt carried in failure payloads.
pub fn truncate_to_last_chars(s: &str, max_chars: usize) -> &str {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        return s;
    }
    let skip = char_count - max_chars;
    match s.char_indices().nth(skip) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_buffer_evicts_oldest() {
        let mut tail = TailBuffer::new(3);
        for i in 0..5 {
            tail.push(format!("line {i}"));
        }
        assert_eq!(tail.len(), 3);
        assert_eq!(tail.join(), "line 2\nline 3\nline 4");
    }

    #[test]
    fn test_tail_buffer_under_capacity() {
        let mut tail = TailBuffer::new(10);
        tail.push("only".to_string());
        assert_eq!(tail.join(), "only");
    }

    #[test]
    fn test_truncate_to_last_chars() {
        assert_eq!(truncate_to_last_chars("abcdef", 3), "def");
        assert_eq!(truncate_to_last_chars("abc", 10), "abc");
        assert_eq!(truncate_to_last_chars("", 5), "");
    }
}
