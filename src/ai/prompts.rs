//! Prompt templates for code review and unit-test generation
//!
//! Also holds the helpers that pull usable code back out of a response.

use regex::Regex;
use std::sync::OnceLock;

/// Marker a review response puts in front of the rewritten source
pub const UPDATED_CODE_MARKER: &str = "Updated Code:";

pub struct PromptTemplate;

impl PromptTemplate {
    pub const REVIEW_SYSTEM: &'static str = "You are a professional code reviewer. \
        Suggest improvements and provide an updated version of the Java code.";

    pub const UNIT_TEST_SYSTEM: &'static str = "You are a professional software engineer \
        specialized in Java unit testing. Generate a complete JUnit test class for the \
        following Java code, using Mockito if necessary.";

    pub fn review_request(code: &str) -> String {
        format!(
            "Review the following Java code, suggest improvements, and return the modified code:\n{}",
            code
        )
    }

    pub fn unit_test_request(code: &str) -> String {
        format!("Generate JUnit test for this class:\n{}", code)
    }
}

/// Text after the first [`UPDATED_CODE_MARKER`], trimmed. `None` when the
/// marker is missing or nothing follows it.
pub fn extract_updated_code(review: &str) -> Option<&str> {
    let (_, rest) = review.split_once(UPDATED_CODE_MARKER)?;
    let code = strip_fence(rest.trim());
    (!code.is_empty()).then_some(code)
}

/// Body of the first fenced code block, if the response has one.
pub fn extract_code_block(response: &str) -> Option<&str> {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    // (?s) so the body may span lines; the info string (`java`) is optional
    let re = FENCE.get_or_init(|| Regex::new(r"(?s)```[\w+-]*[ \t]*\r?\n(.*?)```").expect("valid regex"));
    re.captures(response)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim_end())
}

/// A rewrite wrapped entirely in one fence is unwrapped.
fn strip_fence(code: &str) -> &str {
    if code.starts_with("```") {
        if let Some(body) = extract_code_block(code) {
            return body;
        }
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_request_embeds_code() {
        let prompt = PromptTemplate::review_request("class A {}");
        assert!(prompt.starts_with("Review the following Java code"));
        assert!(prompt.ends_with("\nclass A {}"));
        assert!(PromptTemplate::unit_test_request("class A {}").ends_with("class A {}"));
    }

    #[test]
    fn test_extract_updated_code() {
        let review = "Use final fields.\n\nUpdated Code:\n  class A { final int x = 1; }\n";
        assert_eq!(extract_updated_code(review), Some("class A { final int x = 1; }"));
        assert_eq!(extract_updated_code("Looks fine."), None);
        assert_eq!(extract_updated_code("Updated Code:   \n"), None);
    }

    #[test]
    fn test_updated_code_uses_first_marker() {
        let review = "Updated Code: class A {}\nUpdated Code: class B {}";
        assert_eq!(
            extract_updated_code(review),
            Some("class A {}\nUpdated Code: class B {}")
        );
    }

    #[test]
    fn test_updated_code_in_fence_is_unwrapped() {
        let review = "Notes.\nUpdated Code:\n```java\nclass A {}\n```\n";
        assert_eq!(extract_updated_code(review), Some("class A {}"));
    }

    #[test]
    fn test_extract_code_block() {
        let response = "Here you go:\n```java\nclass ATest {\n}\n```\nand more\n```\nsecond\n```";
        assert_eq!(extract_code_block(response), Some("class ATest {\n}"));
        assert_eq!(extract_code_block("no fences here"), None);
    }
}
