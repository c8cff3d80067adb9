//! Content filter applied to each chunk of a model reply
//!
//! Empty chunks are always dropped. With `strip_reasoning` on, text between
//! `<think>` and `</think>` is removed; a reasoning block may open in one
//! chunk and close several chunks later, and a tag itself may be split
//! across chunks, so the filter keeps state for the duration of one reply.
//! Call [`ContentFilter::finish`] once the model stream ends to release any
//! text held back while waiting for the rest of a tag.

const REASONING_OPEN: &str = "<think>";
const REASONING_CLOSE: &str = "</think>";

/// Per-reply chunk filter
#[derive(Debug, Clone, Default)]
pub struct ContentFilter {
    strip_reasoning: bool,
    in_reasoning: bool,
    /// Tail of the previous chunk that may be the start of a tag
    pending: String,
}

impl ContentFilter {
    pub fn new(strip_reasoning: bool) -> Self {
        Self {
            strip_reasoning,
            ..Self::default()
        }
    }

    /// Returns the part of `chunk` to forward, or `None` to drop it
    pub fn apply(&mut self, chunk: &str) -> Option<String> {
        if chunk.is_empty() {
            return None;
        }
        if !self.strip_reasoning {
            return Some(chunk.to_string());
        }

        let input = std::mem::take(&mut self.pending) + chunk;
        let mut visible = String::with_capacity(input.len());
        let mut rest = input.as_str();
        loop {
            let tag = if self.in_reasoning {
                REASONING_CLOSE
            } else {
                REASONING_OPEN
            };

            if let Some(at) = rest.find(tag) {
                if !self.in_reasoning {
                    visible.push_str(&rest[..at]);
                }
                self.in_reasoning = !self.in_reasoning;
                rest = &rest[at + tag.len()..];
                continue;
            }

            let held = partial_tag_len(rest, tag);
            let (done, tail) = rest.split_at(rest.len() - held);
            if !self.in_reasoning {
                visible.push_str(done);
            }
            self.pending = tail.to_string();
            break;
        }

        non_empty(visible)
    }

    /// Release text held back at the end of the reply
    ///
    /// A partial tag outside a reasoning block is ordinary text; inside an
    /// unterminated block it is dropped with the rest of the block.
    pub fn finish(&mut self) -> Option<String> {
        let pending = std::mem::take(&mut self.pending);
        if self.in_reasoning {
            None
        } else {
            non_empty(pending)
        }
    }
}

/// Length of the longest suffix of `text` that is a proper prefix of `tag`
fn partial_tag_len(text: &str, tag: &str) -> usize {
    (1..tag.len())
        .rev()
        .find(|&len| text.ends_with(&tag[..len]))
        .unwrap_or(0)
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(filter: &mut ContentFilter, chunks: &[&str]) -> Vec<String> {
        let mut out: Vec<String> = chunks.iter().filter_map(|c| filter.apply(c)).collect();
        out.extend(filter.finish());
        out
    }

    #[test]
    fn test_drops_empty_chunks() {
        let mut filter = ContentFilter::new(false);
        assert_eq!(run(&mut filter, &["Hel", "", "lo", " "]), vec!["Hel", "lo", " "]);
    }

    #[test]
    fn test_passes_tags_through_when_disabled() {
        let mut filter = ContentFilter::new(false);
        assert_eq!(filter.apply("<think>hmm</think>").as_deref(), Some("<think>hmm</think>"));
        assert_eq!(filter.apply("<th").as_deref(), Some("<th"));
        assert_eq!(filter.finish(), None);
    }

    #[test]
    fn test_strips_reasoning_within_a_chunk() {
        let mut filter = ContentFilter::new(true);
        assert_eq!(
            filter.apply("before<think>private</think>after").as_deref(),
            Some("beforeafter")
        );
    }

    #[test]
    fn test_strips_reasoning_across_chunks() {
        let mut filter = ContentFilter::new(true);
        let out = run(
            &mut filter,
            &["<think>", "let me ", "consider", "</think>", "The answer", " is 42", "<think>x</think>."],
        );
        assert_eq!(out.concat(), "The answer is 42.");
    }

    #[test]
    fn test_strips_reasoning_when_tags_are_split() {
        let mut filter = ContentFilter::new(true);
        let out = run(&mut filter, &["<th", "ink>secret plan</think>", "Answer"]);
        assert_eq!(out, vec!["Answer"]);

        let mut filter = ContentFilter::new(true);
        let out = run(&mut filter, &["Sure<", "think>hidden</", "thi", "nk> done"]);
        assert_eq!(out.concat(), "Sure done");
    }

    #[test]
    fn test_held_back_text_that_is_not_a_tag() {
        let mut filter = ContentFilter::new(true);
        assert_eq!(filter.apply("a <").as_deref(), Some("a "));
        assert_eq!(filter.apply("b").as_deref(), Some("<b"));

        assert_eq!(filter.apply("x <thi").as_deref(), Some("x "));
        assert_eq!(filter.finish().as_deref(), Some("<thi"));
    }

    #[test]
    fn test_unterminated_reasoning_hides_the_rest() {
        let mut filter = ContentFilter::new(true);
        let out = run(&mut filter, &["Hi", "<think>never", " closed </thi"]);
        assert_eq!(out, vec!["Hi"]);
    }

    #[test]
    fn test_partial_tag_len() {
        assert_eq!(partial_tag_len("abc<thi", REASONING_OPEN), 4);
        assert_eq!(partial_tag_len("abc", REASONING_OPEN), 0);
        assert_eq!(partial_tag_len("x</", REASONING_CLOSE), 2);
        assert_eq!(partial_tag_len("héllo<", REASONING_OPEN), 1);
    }
}
