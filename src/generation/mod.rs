//! Answer generation over retrieved context.

use async_trait::async_trait;

use crate::types::RagError;

#[cfg(feature = "bert-models")]
pub mod bert;

/// Produces a natural-language answer from a query and retrieved context.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(&self, query: &str, context: &str) -> Result<String, RagError>;

    /// Stable identifier used in logs.
    fn id(&self) -> &str;
}

/// Truncates `context` to at most `max_chars` characters.
///
/// Keeps the leading characters and cuts on a `char` boundary, so the result
/// is the same for the same input every time.
pub fn truncate_context(context: &str, max_chars: usize) -> &str {
    match context.char_indices().nth(max_chars) {
        Some((idx, _)) => &context[..idx],
        None => context,
    }
}

/// Deterministic fallback responder.
///
/// Answers with the leading sentences of the retrieved context, bounded by
/// the context budget. Keeps the query path functional in builds without a
/// native model runtime.
pub struct ExtractiveResponder {
    max_context_chars: usize,
    max_sentences: usize,
}

impl ExtractiveResponder {
    pub fn new(max_context_chars: usize) -> Self {
        Self {
            max_context_chars,
            max_sentences: 3,
        }
    }
}

#[async_trait]
impl GenerationProvider for ExtractiveResponder {
    async fn generate(&self, _query: &str, context: &str) -> Result<String, RagError> {
        let context = truncate_context(context, self.max_context_chars);
        let mut answer = String::new();
        let mut sentences = 0usize;
        for piece in context.split_inclusive(['.', '!', '?']) {
            answer.push_str(piece);
            sentences += 1;
            if sentences == self.max_sentences {
                break;
            }
        }
        let answer = answer.trim();
        if answer.is_empty() {
            return Ok(context.trim().to_string());
        }
        Ok(answer.to_string())
    }

    fn id(&self) -> &str {
        "extractive"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncation_is_deterministic_and_char_safe() {
        let context = "héllo wörld, this is a long context";
        let truncated = truncate_context(context, 11);
        assert_eq!(truncated, "héllo wörld");
        assert_eq!(truncated, truncate_context(context, 11));
    }

    #[test]
    fn truncation_is_a_noop_for_short_context() {
        assert_eq!(truncate_context("short", 100), "short");
    }

    #[tokio::test]
    async fn extractive_answer_keeps_leading_sentences() {
        let responder = ExtractiveResponder::new(1000);
        let context = "First sentence. Second sentence. Third sentence. Fourth sentence.";
        let answer = responder.generate("anything", context).await.unwrap();
        assert_eq!(
            answer,
            "First sentence. Second sentence. Third sentence."
        );
    }

    #[tokio::test]
    async fn unpunctuated_context_is_returned_within_budget() {
        let responder = ExtractiveResponder::new(16);
        let answer = responder
            .generate("q", "no punctuation at all in this context")
            .await
            .unwrap();
        assert_eq!(answer, "no punctuation a");
    }

    #[tokio::test]
    async fn generation_is_deterministic() {
        let responder = ExtractiveResponder::new(200);
        let context = "Stable output. Matters for tests.";
        let first = responder.generate("q", context).await.unwrap();
        let second = responder.generate("q", context).await.unwrap();
        assert_eq!(first, second);
    }
}
