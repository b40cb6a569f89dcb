use crate::conversation::{GenerationRequest, TextGenerator};
use crate::error::{Result, TrendAnalyserError};
use crate::llm::types::*;
use futures::future::BoxFuture;
use log::debug;
use reqwest::Client;

const DEFAULT_API_VERSION: &str = "2024-02-15-preview";

#[derive(Debug, Clone)]
pub struct AzureOpenAiSettings {
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
    pub sampling: SamplingParameters,
}

impl AzureOpenAiSettings {
    /// Reads `AZURE_OPENAI_ENDPOINT`, `AZURE_OPENAI_API_KEY`, `AZURE_OPENAI_DEPLOYMENT`
    /// and the optional `AZURE_OPENAI_API_VERSION`.
    pub fn from_env() -> Result<Self> {
        let var = |key: &str| {
            std::env::var(key).map_err(|_| {
                TrendAnalyserError::InvalidConfig(format!("environment variable {} is not set", key))
            })
        };

        Ok(Self {
            endpoint: var("AZURE_OPENAI_ENDPOINT")?,
            api_key: var("AZURE_OPENAI_API_KEY")?,
            deployment: var("AZURE_OPENAI_DEPLOYMENT")?,
            api_version: std::env::var("AZURE_OPENAI_API_VERSION")
                .unwrap_or_else(|_| DEFAULT_API_VERSION.to_string()),
            sampling: SamplingParameters::default(),
        })
    }
}

#[derive(Clone)]
pub struct AzureOpenAiClient {
    client: Client,
    settings: AzureOpenAiSettings,
}

impl AzureOpenAiClient {
    pub fn new(settings: AzureOpenAiSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    pub fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.deployment,
            self.settings.api_version
        )
    }

    pub async fn complete(&self, request: &GenerationRequest) -> Result<String> {
        let payload = ChatCompletionRequest::new(request, &self.settings.sampling);
        debug!(
            "Calling deployment '{}' with {} messages",
            self.settings.deployment,
            payload.messages.len()
        );

        let res = self
            .client
            .post(self.completions_url())
            .header("api-key", &self.settings.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let err_text = res.text().await?;
            return Err(TrendAnalyserError::Generation(format!(
                "chat completion failed (status {}): {}",
                status, err_text
            )));
        }

        let body: ChatCompletionResponse = res.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| TrendAnalyserError::Generation("No content returned".to_string()))
    }
}

impl TextGenerator for AzureOpenAiClient {
    fn generate<'a>(&'a self, request: &'a GenerationRequest) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.complete(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ChatMessage;

    fn settings() -> AzureOpenAiSettings {
        AzureOpenAiSettings {
            endpoint: "https://example.openai.azure.com/".into(),
            api_key: "test".into(),
            deployment: "gpt35".into(),
            api_version: DEFAULT_API_VERSION.into(),
            sampling: SamplingParameters::default(),
        }
    }

    #[test]
    fn test_completions_url() {
        let client = AzureOpenAiClient::new(settings());
        assert_eq!(
            client.completions_url(),
            "https://example.openai.azure.com/openai/deployments/gpt35/chat/completions?api-version=2024-02-15-preview"
        );
    }

    #[test]
    fn test_payload_puts_system_first() {
        let request = GenerationRequest {
            system: "be brief".into(),
            messages: vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")],
        };
        let sampling = SamplingParameters::default();
        let json = serde_json::to_value(ChatCompletionRequest::new(&request, &sampling)).unwrap();

        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][0]["content"], "be brief");
        assert_eq!(json["messages"][2]["role"], "assistant");
        assert_eq!(json["max_tokens"], 2048);
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Summary"}}]}"#;
        let parsed: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("Summary"));
    }
}
