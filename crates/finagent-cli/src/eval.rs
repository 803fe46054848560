use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use console::style;
use futures::TryStreamExt;
use serde::Serialize;

use finagent::agent::Agent;
use finagent::extract::{extract_tool_usage, get_documents, DEFAULT_TARGET_TOOL};
use finagent::models::document::Document;
use finagent::models::message::Transcript;
use finagent::models::role::Role;
use finagent::prompt::{format_question, RESEARCH_SYSTEM_PROMPT};
use finagent::providers::openai::OpenAiProvider;
use finagent::retriever::{HttpRetriever, Retriever, StaticRetriever};
use finagent::systems::research::ResearchSystem;
use finagent::systems::web::WebSearchClient;

use crate::dataset;
use crate::printer::ChatMessagePrinter;
use crate::transcripts;

pub struct RunConfig {
    pub dataset: PathBuf,
    pub corpus: Option<PathBuf>,
    pub retriever_url: Option<String>,
    pub search_url: Option<String>,
    pub output: PathBuf,
    pub transcript_dir: Option<PathBuf>,
    pub limit: Option<usize>,
}

/// One scored interaction: the answer, the routing-compliance signal,
/// and the grounding documents the retrieval tool returned.
#[derive(Debug, Serialize)]
struct EvalRecord {
    question: String,
    answer: String,
    tool_usage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    expected_tool: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_usage_matches: Option<bool>,
    documents: Vec<Document>,
}

fn build_retriever(config: &RunConfig) -> Result<Arc<dyn Retriever>> {
    match (&config.corpus, &config.retriever_url) {
        (Some(path), _) => Ok(Arc::new(StaticRetriever::from_json_file(path)?)),
        (None, Some(url)) => Ok(Arc::new(HttpRetriever::new(url.clone())?)),
        (None, None) => Err(anyhow!(
            "pass --corpus for the offline retriever or --retriever-url for a document store"
        )),
    }
}

fn search_url(config: &RunConfig) -> Result<String> {
    config
        .search_url
        .clone()
        .or_else(|| std::env::var("FINAGENT_SEARCH_URL").ok())
        .ok_or_else(|| anyhow!("pass --search-url or set FINAGENT_SEARCH_URL"))
}

pub async fn run(config: RunConfig) -> Result<()> {
    let mut samples = dataset::load_samples(&config.dataset)?;
    if let Some(limit) = config.limit {
        samples.truncate(limit);
    }

    let retriever = build_retriever(&config)?;
    let search = WebSearchClient::new(search_url(&config)?)?;
    let provider = OpenAiProvider::from_env()?;

    let mut agent = Agent::new(Box::new(provider), RESEARCH_SYSTEM_PROMPT);
    agent.add_system(Box::new(ResearchSystem::new(retriever, search)));

    let transcript_dir = match &config.transcript_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            dir.clone()
        }
        None => transcripts::ensure_transcript_dir()?,
    };

    let printer = ChatMessagePrinter::new();
    let mut records = Vec::new();

    for (index, sample) in samples.iter().enumerate() {
        println!(
            "\n{}",
            style(format!(
                "=== QUESTION {}/{}: {} ===",
                index + 1,
                samples.len(),
                sample.question
            ))
            .bold()
        );

        let initial = vec![format_question(&sample.question)];
        let mut messages = initial.clone();
        for (i, message) in messages.iter().enumerate() {
            printer.print_message(message, i + 1);
        }

        let mut stream = agent.reply(&initial).await?;
        while let Some(message) = stream.try_next().await? {
            printer.print_message(&message, messages.len() + 1);
            messages.push(message);
        }

        let transcript = Transcript::new(messages);
        let transcript_path = transcript_dir.join(format!("question_{:03}.jsonl", index));
        transcripts::persist_transcript(&transcript_path, &transcript)
            .with_context(|| format!("persisting {}", transcript_path.display()))?;

        let documents = get_documents(&transcript, DEFAULT_TARGET_TOOL);
        let tool_usage = extract_tool_usage(&transcript);
        let answer = final_answer(&transcript);
        let tool_usage_matches = sample
            .expected_tool
            .as_ref()
            .map(|expected| expected == &tool_usage);

        records.push(EvalRecord {
            question: sample.question.clone(),
            answer,
            tool_usage,
            expected_tool: sample.expected_tool.clone(),
            tool_usage_matches,
            documents,
        });
    }

    fs::write(&config.output, serde_json::to_string_pretty(&records)?)
        .with_context(|| format!("writing eval records to {}", config.output.display()))?;

    print_summary(&records, &config.output);
    Ok(())
}

// The answer is the text of the last assistant message.
fn final_answer(transcript: &Transcript) -> String {
    transcript
        .messages
        .iter()
        .rev()
        .find(|message| message.role == Role::Assistant)
        .map(|message| message.text())
        .unwrap_or_default()
}

fn print_summary(records: &[EvalRecord], output: &std::path::Path) {
    let scored = records
        .iter()
        .filter(|r| r.tool_usage_matches.is_some())
        .count();
    let compliant = records
        .iter()
        .filter(|r| r.tool_usage_matches == Some(true))
        .count();

    println!("\n{}", style("=== SUMMARY ===").bold());
    println!("Questions: {}", records.len());
    if scored > 0 {
        println!("Tool routing compliant: {}/{}", compliant, scored);
    }
    println!("Eval records written to {}", output.display());
}
