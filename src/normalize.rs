//! Normalizer stage: strip leftover markup and tidy whitespace.

use crate::models::Article;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument};

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^<]+?>").unwrap());
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Clean a single text field.
///
/// Tags are removed first, so whitespace on either side of a removed tag is
/// collapsed together in the next step. Removal repeats until no tag is left,
/// since stripping `<z>` out of `<y <z> w>` exposes `<y  w>`. Runs of
/// whitespace then become a single space and the ends are trimmed.
///
/// ```ignore
/// assert_eq!(clean_text("<b>  Hello   World </b>"), "Hello World");
/// ```
pub fn clean_text(text: &str) -> String {
    let mut without_tags = TAG_RE.replace_all(text, "").into_owned();
    while TAG_RE.is_match(&without_tags) {
        without_tags = TAG_RE.replace_all(&without_tags, "").into_owned();
    }
    let collapsed = WHITESPACE_RE.replace_all(&without_tags, " ");
    collapsed.trim().to_string()
}

/// Clean both fields of every article, keeping length and order.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub fn normalize(mut articles: Vec<Article>) -> Vec<Article> {
    for article in &mut articles {
        article.title = clean_text(&article.title);
        article.description = clean_text(&article.description);
    }
    debug!("Normalized article text");
    articles
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_example_record() {
        let articles = normalize(vec![Article {
            title: "<b>  Hello   World </b>".to_string(),
            description: "<p>desc\n\ttext</p>".to_string(),
        }]);
        assert_eq!(
            articles,
            vec![Article {
                title: "Hello World".to_string(),
                description: "desc text".to_string(),
            }]
        );
    }

    #[test]
    fn test_clean_text_removes_tags_with_attributes() {
        assert_eq!(
            clean_text(r#"<a href="/x" class="link">Read <em>more</em></a>"#),
            "Read more"
        );
    }

    #[test]
    fn test_clean_text_collapses_unicode_whitespace() {
        assert_eq!(clean_text("one\u{00A0}\u{2003} two\r\nthree"), "one two three");
    }

    #[test]
    fn test_clean_text_leaves_plain_text_alone() {
        assert_eq!(clean_text("Already clean"), "Already clean");
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text(" \n\t "), "");
    }

    #[test]
    fn test_clean_text_bare_angle_brackets() {
        assert_eq!(clean_text("3 < 5 and 7 > 2"), "3 2");
        assert_eq!(clean_text("a <> b"), "a <> b");
    }

    #[test]
    fn test_clean_text_strips_exposed_tags() {
        assert_eq!(clean_text("x <y <z> w> v"), "x v");
    }

    #[test]
    fn test_clean_text_is_idempotent() {
        let samples = [
            "<b>  Hello   World </b>",
            "<<b>>nested<</b>>",
            "x <y <z> w> v",
            "  \t<p>\n</p>  ",
            "plain words",
            "<div><span> a </span>\n<span> b </span></div>",
        ];
        for sample in samples {
            let once = clean_text(sample);
            assert_eq!(clean_text(&once), once, "sample {sample:?}");
        }
    }

    #[test]
    fn test_clean_text_output_has_no_tags_or_runs() {
        let samples = ["<h2>Title</h2>\n\n<p>Body  text</p>", "<i>x</i>   <i>y</i>"];
        for sample in samples {
            let cleaned = clean_text(sample);
            assert!(!TAG_RE.is_match(&cleaned), "tag left in {cleaned:?}");
            assert!(!cleaned.contains("  "));
            assert_eq!(cleaned, cleaned.trim());
        }
    }

    #[test]
    fn test_normalize_preserves_order_and_length() {
        let input = vec![
            Article::from_parts(Some(" b ".into()), None),
            Article::from_parts(Some(" a ".into()), None),
        ];
        let output = normalize(input);
        assert_eq!(output.len(), 2);
        assert_eq!(output[0].title, "b");
        assert_eq!(output[1].title, "a");
        assert_eq!(output[1].description, "No description");
    }
}
