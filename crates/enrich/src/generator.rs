//! Chat-completion backed metadata generation.

use std::time::Duration;

use {
    anyhow::{Context, Result, anyhow},
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    skillery_catalog::TaxonomySnapshot,
    tracing::debug,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// The skill fields the model sees. Nothing else leaves the catalog.
#[derive(Debug, Clone)]
pub struct SkillInput {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct GeneratedMetadata {
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Seam for the backfill loop; tests substitute a scripted implementation.
#[async_trait]
pub trait MetadataGenerator: Send + Sync {
    async fn generate(
        &self,
        skill: &SkillInput,
        taxonomy: &TaxonomySnapshot,
    ) -> Result<GeneratedMetadata>;
}

// ── OpenAI-compatible implementation ────────────────────────────────────────

pub struct OpenAiGenerator {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiGenerator {
    pub fn new(api_key: Option<String>, model: Option<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    /// Point at a different OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn build_prompt(skill: &SkillInput, taxonomy: &TaxonomySnapshot) -> String {
        format!(
            "Assign a category and 2-4 short tags for this skill.\n\
             Prefer values from the existing taxonomy when one fits.\n\n\
             Existing categories: {}\n\
             Existing tags: {}\n\n\
             Skill name: {}\n\
             Skill description: {}\n\n\
             Respond with a JSON object: {{\"category\": \"...\", \"tags\": [\"...\"]}}",
            taxonomy.categories.join(", "),
            taxonomy.tags.join(", "),
            skill.name,
            skill.description,
        )
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat<'a>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[async_trait]
impl MetadataGenerator for OpenAiGenerator {
    async fn generate(
        &self,
        skill: &SkillInput,
        taxonomy: &TaxonomySnapshot,
    ) -> Result<GeneratedMetadata> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("no OpenAI API key configured"))?;

        let prompt = Self::build_prompt(skill, taxonomy);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: &prompt }],
            response_format: ResponseFormat { kind: "json_object" },
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .context("chat completion request failed")?
            .error_for_status()
            .context("chat completion returned an error status")?;

        let body: ChatResponse = response.json().await.context("malformed chat response")?;
        let content = body
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| anyhow!("chat response contained no choices"))?;

        debug!(skill = %skill.name, "parsed generated metadata");
        serde_json::from_str(content).context("model output was not the expected JSON object")
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn taxonomy() -> TaxonomySnapshot {
        TaxonomySnapshot {
            categories: vec!["Tools".into()],
            tags: vec!["cli".into()],
        }
    }

    fn skill() -> SkillInput {
        SkillInput {
            name: "Formatter".into(),
            description: "Formats source files".into(),
        }
    }

    #[tokio::test]
    async fn parses_generated_metadata() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .with_status(200)
            .with_body(
                r#"{"choices":[{"message":{"content":
                    "{\"category\":\"Tools\",\"tags\":[\"cli\",\"format\"]}"}}]}"#,
            )
            .create_async()
            .await;

        let generator = OpenAiGenerator::new(Some("test-key".into()), None)
            .with_base_url(server.url());
        let generated = generator.generate(&skill(), &taxonomy()).await.unwrap();

        assert_eq!(generated.category, "Tools");
        assert_eq!(generated.tags, vec!["cli", "format"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_api_key_is_an_error() {
        let generator = OpenAiGenerator::new(None, None);
        let err = generator.generate(&skill(), &taxonomy()).await.unwrap_err();
        assert!(err.to_string().contains("API key"));
    }

    #[tokio::test]
    async fn upstream_error_status_propagates() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .create_async()
            .await;

        let generator = OpenAiGenerator::new(Some("k".into()), None).with_base_url(server.url());
        assert!(generator.generate(&skill(), &taxonomy()).await.is_err());
    }

    #[tokio::test]
    async fn non_json_model_output_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"not json"}}]}"#)
            .create_async()
            .await;

        let generator = OpenAiGenerator::new(Some("k".into()), None).with_base_url(server.url());
        assert!(generator.generate(&skill(), &taxonomy()).await.is_err());
    }
}
