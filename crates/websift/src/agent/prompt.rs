//! Fixed prompts for the relevance filter and the answering assistants.

use crate::context::ContentItem;

/// System prompt for relevance extraction.
pub const FILTER_SYSTEM_PROMPT: &str = "\
You are a smart assistant. Your job is to extract the information that is \
needed to answer the question. The extraction must be short and precise.

Rules:
- Only copy facts that appear in the data. Do not answer from your own knowledge.
- Keep numbers, names and dates verbatim.
- If nothing in the data helps answer the question, return an empty string \
  in `extracted_data`.";

/// System prompt for the retrieval-augmented assistant.
pub const ANSWER_SYSTEM_PROMPT: &str = "\
You are a smart assistant. Your job is to answer the question using your \
knowledge and the information provided.";

/// System prompt for the tool-calling assistant.
pub const TOOL_SYSTEM_PROMPT: &str = "\
You are a smart assistant. Your job is to answer the question using your \
knowledge and the information provided. If you need more information, call \
the `web_search` function to search the web, then answer using what it returns.";

/// Header placed between the question and the injected evidence.
pub const EVIDENCE_HEADER: &str = "Answer using the following information:";

/// Build the `(system, user)` pair for one relevance extraction.
pub fn filter_request(question: &str, data: &[String]) -> (String, String) {
    let joined = data
        .iter()
        .map(|d| d.trim())
        .filter(|d| !d.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");
    let user = format!(
        "The question is: {question}\n\
         Extract relevant information from the following data which is needed \
         to answer the question:\n\n{joined}"
    );
    (FILTER_SYSTEM_PROMPT.to_string(), user)
}

/// The user message for a retrieval-augmented answer: the question,
/// followed by the evidence when there is any.
pub fn inject_evidence(question: &str, evidence: &[ContentItem]) -> String {
    let texts: Vec<&str> = evidence
        .iter()
        .map(|item| item.text.trim())
        .filter(|t| !t.is_empty())
        .collect();
    if texts.is_empty() {
        return question.to_string();
    }
    format!("{question}\n\n{EVIDENCE_HEADER}\n{}", texts.join("\n\n"))
}
