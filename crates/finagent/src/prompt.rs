use indoc::{formatdoc, indoc};

use crate::models::message::Message;

/// System prompt enforcing the one-tool-per-turn routing policy the
/// evaluation scores against.
pub const RESEARCH_SYSTEM_PROMPT: &str = indoc! {"
    You are a professional Amazon research agent with access to two tools:
    1. RAG context retrieval tool (`rag_tool`): Contains Amazon 10-K filings data through 2023.
    2. Web search tool (`web_search`): For current information beyond 2023.

    TOOL SELECTION RULES:
    - Use ONLY `rag_tool` for questions about Amazon data from 2023 or earlier.
    - Use ONLY `web_search` for questions about Amazon data from 2024 or later.
    - NEVER use both tools for a single query.
    - You must call the single tool you selected based on the criteria ONCE AND ONLY ONCE.

    EXAMPLES FOR RAG TOOL (2023 and earlier data):
    - \"What was Amazon's revenue in 2022?\" -> rag_tool
    - \"Who was Amazon's CFO in 2023?\" -> rag_tool
    - \"What were Amazon's operating expenses in 2021?\" -> rag_tool

    EXAMPLES FOR WEB SEARCH TOOL (2024 and later data):
    - \"What is Amazon's current stock price?\" -> web_search
    - \"What are Amazon's 2024 earnings?\" -> web_search
    - \"Who is Amazon's current CEO?\" -> web_search

    DECISION LOGIC:
    - If the question asks about historical data (2023 or earlier) -> rag_tool.
    - If the question asks about current/recent data (2024 or later) -> web_search.
    - If the question doesn't specify a time period but asks for \"current\" information -> web_search.

    Give concise, factual answers without preamble. Always use exactly one tool per response.
"};

/// Build the user message for one evaluation question, restating the
/// one-tool policy the way the agent is scored on.
pub fn format_question(question: &str) -> Message {
    let text = formatdoc! {"
        Using only ONE of the available tools, accurately answer the following question:

        {question}

        CRITICAL INSTRUCTIONS:
        - Select EXACTLY ONE tool based on the time period criteria in your system prompt
        - Make ONLY ONE tool call - do not break down or modify the query
        - If the question is about 2023 or earlier Amazon data -> use rag_tool
        - If the question is about 2024+ or current Amazon data -> use web_search
        - Answer directly after your single tool call
    "};
    Message::user().with_text(text.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::role::Role;

    #[test]
    fn test_format_question_embeds_the_question() {
        let message = format_question("What was Amazon's revenue in 2022?");
        assert_eq!(message.role, Role::User);
        let text = message.text();
        assert!(text.contains("What was Amazon's revenue in 2022?"));
        assert!(text.contains("EXACTLY ONE tool"));
    }

    #[test]
    fn test_system_prompt_names_both_tools() {
        assert!(RESEARCH_SYSTEM_PROMPT.contains("rag_tool"));
        assert!(RESEARCH_SYSTEM_PROMPT.contains("web_search"));
    }
}
