//! Prompt rendering and task routing in front of a completion backend

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::{Error, Result};
use crate::model_router::ModelRouter;
use crate::prompts::{PromptId, PromptLibrary};

use super::types::{CompletionRequest, RouterInfo};
use super::AIClient;

/// Runs one prompt against the completion service
///
/// Each run is a single attempt. An empty reply counts as a failure so
/// callers only ever see usable text or an error.
#[derive(Clone)]
pub struct TaskRunner {
    client: AIClient,
    router: Arc<ModelRouter>,
    prompts: Arc<Mutex<PromptLibrary>>,
}

impl TaskRunner {
    /// Use the default model config and prompt library (with overrides)
    pub fn new(client: AIClient) -> Self {
        Self::with_parts(client, ModelRouter::default(), PromptLibrary::new())
    }

    pub fn with_parts(client: AIClient, router: ModelRouter, prompts: PromptLibrary) -> Self {
        Self {
            client,
            router: Arc::new(router),
            prompts: Arc::new(Mutex::new(prompts)),
        }
    }

    /// Create from environment variables; None when no backend is configured
    pub fn from_env() -> Option<Self> {
        AIClient::from_env().map(Self::new)
    }

    pub fn client(&self) -> &AIClient {
        &self.client
    }

    pub fn router_info(&self) -> RouterInfo {
        self.router.info(self.client.model())
    }

    /// Build the request for a prompt without sending it
    pub fn request(&self, id: PromptId, vars: &HashMap<&str, &str>) -> Result<CompletionRequest> {
        let mut prompts = self
            .prompts
            .lock()
            .map_err(|_| Error::InvalidData("Failed to acquire prompt library lock".into()))?;
        let prompt = prompts.get(id)?;
        let task = prompt.task_type()?;
        let config = self.router.config_for_task(task);

        Ok(CompletionRequest {
            model: self.router.model_for_task(task, self.client.model()),
            system: prompt.render_system(vars),
            prompt: prompt.render_user(vars),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    /// Render and send a prompt, returning the trimmed reply
    pub async fn run(&self, id: PromptId, vars: &HashMap<&str, &str>) -> Result<String> {
        let request = self.request(id, vars)?;
        debug!(
            prompt = id.as_str(),
            model = %request.model,
            max_tokens = request.max_tokens,
            "Sending completion request"
        );

        let reply = self.client.complete(&request).await?;
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(Error::Completion(format!(
                "Empty response for prompt {}",
                id.as_str()
            )));
        }
        Ok(reply.to_string())
    }
}
