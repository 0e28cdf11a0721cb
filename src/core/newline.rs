//! New-line policy
//!
//! After an end tag, the tokenizer asks the policy whether the tag is a
//! line-breaking one. If so, the whitespace-pending flag is reset so a
//! single space or newline immediately following the close is not
//! re-emitted as content. Strict XML parsing uses the `NeverNewLine`
//! policy; HTML parsing uses `HtmlNewLine`.

/// Decides whether a just-closed tag suppresses trailing whitespace.
pub trait NewLinePolicy {
    fn is_new_line_tag(&self, tag: &str) -> bool;
}

/// Policy for strict XML parsing: no tag is line-breaking.
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverNewLine;

impl NewLinePolicy for NeverNewLine {
    #[inline]
    fn is_new_line_tag(&self, _tag: &str) -> bool {
        false
    }
}

/// Block-level tags conventionally rendered with a line break.
///
/// This is domain convention, not a derivable rule; the set is fixed data.
/// Tag names are compared as given, so HTML mode (which lower-cases tag
/// names on finalization) matches regardless of source case.
const NEW_LINE_TAGS: &[&str] = &[
    "blockquote", "br", "dd", "div", "dl", "dt", "h1", "h2", "h3", "h4", "h5", "h6", "hr", "li",
    "ol", "p", "pre", "table", "tr", "ul",
];

/// Policy for HTML parsing: a fixed set of block-level tags break lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlNewLine;

impl NewLinePolicy for HtmlNewLine {
    #[inline]
    fn is_new_line_tag(&self, tag: &str) -> bool {
        NEW_LINE_TAGS.contains(&tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_policy() {
        let policy = NeverNewLine;
        assert!(!policy.is_new_line_tag("p"));
        assert!(!policy.is_new_line_tag("div"));
    }

    #[test]
    fn test_html_policy() {
        let policy = HtmlNewLine;
        assert!(policy.is_new_line_tag("p"));
        assert!(policy.is_new_line_tag("br"));
        assert!(policy.is_new_line_tag("h3"));
        assert!(!policy.is_new_line_tag("span"));
        assert!(!policy.is_new_line_tag("b"));
    }

    #[test]
    fn test_new_line_table_sorted() {
        let mut sorted = NEW_LINE_TAGS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, NEW_LINE_TAGS);
    }
}
