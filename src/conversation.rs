use crate::error::Result;
use crate::narrative::NarrativePrompt;
use crate::schema::AnalyserConfig;
use crate::table::RawTable;
use futures::future::BoxFuture;
use log::debug;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are an AI assistant that helps people find information.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Everything the text generator receives for one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub system: String,
    pub messages: Vec<ChatMessage>,
}

impl GenerationRequest {
    pub fn single(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            messages: vec![ChatMessage::user(user)],
        }
    }
}

impl From<&NarrativePrompt> for GenerationRequest {
    fn from(prompt: &NarrativePrompt) -> Self {
        Self::single(DEFAULT_SYSTEM_PROMPT, prompt.render())
    }
}

/// External text-in/text-out service.
///
/// Implementations own transport, timeouts and retries; callers here make
/// exactly one attempt.
pub trait TextGenerator: Send + Sync {
    fn generate<'a>(&'a self, request: &'a GenerationRequest) -> BoxFuture<'a, Result<String>>;
}

/// Hands a finished prompt to the generator once.
pub async fn summarize<G>(generator: &G, prompt: &NarrativePrompt) -> Result<String>
where
    G: TextGenerator + ?Sized,
{
    let request = GenerationRequest::from(prompt);
    generator.generate(&request).await
}

/// Grounding text for Q&A over one uploaded workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatContext {
    system: String,
}

impl ChatContext {
    pub fn new(
        config: &AnalyserConfig,
        statement: Option<&RawTable>,
        competitive: Option<&RawTable>,
        demographic: Option<&RawTable>,
    ) -> Self {
        let company = config.focus_company.as_deref().unwrap_or("the company");
        let mut system = format!(
            "Act as an experienced sales analyst. As a Q&A assistant of {company}, your task is to \
             answer questions that are relevant to the data provided below.\n"
        );

        if let Some(table) = statement {
            system.push_str(&format!(
                "\nFinancial statement of {company} (values in {} except per-share figures):\n{}",
                config.units.currency_unit,
                table.to_text()
            ));
        }
        if let Some(table) = competitive {
            system.push_str(&format!(
                "\nCompetitive analysis of {company} and its peers:\n{}",
                table.to_text()
            ));
        }
        if let Some(table) = demographic {
            system.push_str(&format!(
                "\nShare of each age group preferring each company:\n{}",
                table.to_text()
            ));
        }

        system.push_str(
            "\nIf the question can be answered from the data, answer directly without explanation. \
             If it asks for a business decision, ground the answer in the trends in the data. \
             If the question is unrelated to the data or the industry, respond with \
             \"Sorry, I can't answer your question as I don't have the corresponding data\".",
        );

        Self { system }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system
    }
}

/// Caller-owned chat transcript. Turns are appended only after a successful reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn build_request(&self, context: &ChatContext, question: &str) -> GenerationRequest {
        let mut messages = self.messages.clone();
        messages.push(ChatMessage::user(question));
        GenerationRequest {
            system: context.system_prompt().to_string(),
            messages,
        }
    }

    pub async fn ask<G>(
        &mut self,
        generator: &G,
        context: &ChatContext,
        question: &str,
    ) -> Result<String>
    where
        G: TextGenerator + ?Sized,
    {
        let request = self.build_request(context, question);
        debug!("Sending chat request with {} messages", request.messages.len());

        let answer = generator.generate(&request).await?;
        self.messages.push(ChatMessage::user(question));
        self.messages.push(ChatMessage::assistant(answer.clone()));
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TrendAnalyserError;
    use futures::FutureExt;

    struct CountingGenerator;

    impl TextGenerator for CountingGenerator {
        fn generate<'a>(
            &'a self,
            request: &'a GenerationRequest,
        ) -> BoxFuture<'a, Result<String>> {
            async move { Ok(format!("seen {} messages", request.messages.len())) }.boxed()
        }
    }

    struct FailingGenerator;

    impl TextGenerator for FailingGenerator {
        fn generate<'a>(
            &'a self,
            _request: &'a GenerationRequest,
        ) -> BoxFuture<'a, Result<String>> {
            async move { Err(TrendAnalyserError::Generation("service unavailable".into())) }
                .boxed()
        }
    }

    fn context() -> ChatContext {
        let config = AnalyserConfig {
            focus_company: Some("VB".into()),
            ..AnalyserConfig::default()
        };
        let demographic = RawTable::new(
            "demograph",
            vec!["Age group".into(), "VB".into()],
            vec![vec!["18-25".into(), 40.0.into()]],
        )
        .unwrap();
        ChatContext::new(&config, None, None, Some(&demographic))
    }

    #[test]
    fn test_context_embeds_tables() {
        let context = context();
        assert!(context.system_prompt().contains("Q&A assistant of VB"));
        assert!(context.system_prompt().contains("18-25"));
        assert!(!context.system_prompt().contains("Financial statement"));
    }

    #[tokio::test]
    async fn test_ask_appends_both_turns() {
        let mut conversation = Conversation::new();
        let context = context();

        let first = conversation
            .ask(&CountingGenerator, &context, "Which age group prefers VB?")
            .await
            .unwrap();
        assert_eq!(first, "seen 1 messages");
        assert_eq!(conversation.len(), 2);

        let second = conversation
            .ask(&CountingGenerator, &context, "And the peers?")
            .await
            .unwrap();
        assert_eq!(second, "seen 3 messages");
        assert_eq!(conversation.messages()[2], ChatMessage::user("And the peers?"));
        assert_eq!(conversation.messages()[3].role, ChatRole::Assistant);
    }

    #[tokio::test]
    async fn test_failed_generation_leaves_transcript_untouched() {
        let mut conversation = Conversation::new();
        let result = conversation
            .ask(&FailingGenerator, &context(), "Anything?")
            .await;
        assert!(matches!(result, Err(TrendAnalyserError::Generation(_))));
        assert!(conversation.is_empty());
    }

    #[tokio::test]
    async fn test_summarize_sends_rendered_prompt() {
        let config = AnalyserConfig::default();
        let prompt = crate::narrative::NarrativePromptBuilder::new(&config)
            .build(&["2020".to_string()], &[])
            .unwrap();
        let request = GenerationRequest::from(&prompt);
        assert_eq!(request.system, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(request.messages[0].content, prompt.render());

        let reply = summarize(&CountingGenerator, &prompt).await.unwrap();
        assert_eq!(reply, "seen 1 messages");
    }
}
