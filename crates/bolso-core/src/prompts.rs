//! Prompt library for the completion service
//!
//! Prompts live as markdown files with YAML frontmatter (`id`, `version`,
//! `task_type`) and `# System` / `# User` sections. Resolution order:
//! 1. Override in data dir (~/.local/share/bolso/prompts/overrides/<id>.md)
//! 2. Embedded default (compiled into binary)
//!
//! Templates use `{{var}}` placeholders and `{{#if var}}...{{/if}}` blocks
//! that are dropped when `var` is missing or empty.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::model_router::TaskType;

/// Embedded default prompts (compiled into binary)
mod defaults {
    pub const CLASSIFY_INTENT: &str = include_str!("../../../prompts/classify_intent.md");
    pub const PARSE_EXPENSE: &str = include_str!("../../../prompts/parse_expense.md");
    pub const ANSWER_QUESTION: &str = include_str!("../../../prompts/answer_question.md");
    pub const ANALYZE_FINANCES: &str = include_str!("../../../prompts/analyze_finances.md");
    pub const CONVERSE: &str = include_str!("../../../prompts/converse.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    ClassifyIntent,
    ParseExpense,
    /// Lead-in sent before the numeric answer to a question
    AnswerQuestion,
    AnalyzeFinances,
    /// Greetings and small talk
    Converse,
}

impl PromptId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClassifyIntent => "classify_intent",
            Self::ParseExpense => "parse_expense",
            Self::AnswerQuestion => "answer_question",
            Self::AnalyzeFinances => "analyze_finances",
            Self::Converse => "converse",
        }
    }

    pub fn all() -> &'static [PromptId] {
        &[
            Self::ClassifyIntent,
            Self::ParseExpense,
            Self::AnswerQuestion,
            Self::AnalyzeFinances,
            Self::Converse,
        ]
    }

    fn default_content(&self) -> &'static str {
        match self {
            Self::ClassifyIntent => defaults::CLASSIFY_INTENT,
            Self::ParseExpense => defaults::PARSE_EXPENSE,
            Self::AnswerQuestion => defaults::ANSWER_QUESTION,
            Self::AnalyzeFinances => defaults::ANALYZE_FINANCES,
            Self::Converse => defaults::CONVERSE,
        }
    }
}

impl std::str::FromStr for PromptId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("Unknown prompt: {}", s))
    }
}

/// Prompt frontmatter metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    /// Bumped whenever the wording changes
    pub version: u32,
    /// Task type key used for model routing
    pub task_type: String,
}

/// A loaded prompt
#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    /// Body after the frontmatter
    pub content: String,
    pub is_override: bool,
    pub override_path: Option<PathBuf>,
}

impl Prompt {
    pub fn system_section(&self) -> Option<&str> {
        extract_section(&self.content, "# System")
    }

    pub fn user_section(&self) -> Option<&str> {
        extract_section(&self.content, "# User")
    }

    /// Task this prompt is routed as
    pub fn task_type(&self) -> Result<TaskType> {
        self.metadata
            .task_type
            .parse()
            .map_err(|e: String| Error::InvalidData(format!("Prompt {}: {}", self.metadata.id, e)))
    }

    /// Render the system section, if the prompt has one
    pub fn render_system(&self, vars: &HashMap<&str, &str>) -> Option<String> {
        self.system_section().map(|s| fill(s, vars))
    }

    /// Render the user section (or the whole body when it has no sections)
    pub fn render_user(&self, vars: &HashMap<&str, &str>) -> String {
        fill(self.user_section().unwrap_or(&self.content), vars)
    }
}

fn fill(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    remove_unmatched_conditionals(&result, vars)
}

/// Prompt library for loading and caching prompts
pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
    cache: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    /// Create a new prompt library with default paths
    pub fn new() -> Self {
        Self {
            override_dir: default_prompts_dir(),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with a custom override directory
    pub fn with_override_dir(path: PathBuf) -> Self {
        Self {
            override_dir: Some(path),
            cache: HashMap::new(),
        }
    }

    /// Create a prompt library with no override directory (embedded only)
    pub fn embedded_only() -> Self {
        Self {
            override_dir: None,
            cache: HashMap::new(),
        }
    }

    /// Get a prompt by ID, loading from override or default
    pub fn get(&mut self, id: PromptId) -> Result<&Prompt> {
        if !self.cache.contains_key(&id) {
            let prompt = self.load(id)?;
            self.cache.insert(id, prompt);
        }
        self.cache
            .get(&id)
            .ok_or_else(|| Error::NotFound(format!("prompt {}", id.as_str())))
    }

    fn override_path(&self, id: PromptId) -> Option<PathBuf> {
        self.override_dir
            .as_ref()
            .map(|d| d.join(format!("{}.md", id.as_str())))
            .filter(|p| p.exists())
    }

    fn load(&self, id: PromptId) -> Result<Prompt> {
        if let Some(path) = self.override_path(id) {
            let content = fs::read_to_string(&path).map_err(|e| {
                Error::InvalidData(format!("Failed to read prompt override: {}", e))
            })?;
            let (metadata, body) = parse_prompt(&content)?;
            return Ok(Prompt {
                metadata,
                content: body,
                is_override: true,
                override_path: Some(path),
            });
        }

        let (metadata, body) = parse_prompt(id.default_content())?;
        Ok(Prompt {
            metadata,
            content: body,
            is_override: false,
            override_path: None,
        })
    }

    /// List all prompts with their override status
    pub fn list(&mut self) -> Vec<PromptInfo> {
        PromptId::all()
            .iter()
            .map(|&id| {
                let override_path = self.override_path(id);
                let prompt = self.get(id).ok();
                PromptInfo {
                    id: id.as_str().to_string(),
                    version: prompt.map(|p| p.metadata.version).unwrap_or(0),
                    task_type: prompt
                        .map(|p| p.metadata.task_type.clone())
                        .unwrap_or_default(),
                    has_override: override_path.is_some(),
                    override_path,
                }
            })
            .collect()
    }

    pub fn override_dir(&self) -> Option<&PathBuf> {
        self.override_dir.as_ref()
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Information about a prompt for listing
#[derive(Debug, Clone)]
pub struct PromptInfo {
    pub id: String,
    pub version: u32,
    pub task_type: String,
    pub has_override: bool,
    pub override_path: Option<PathBuf>,
}

/// Default prompts override directory
pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("bolso").join("prompts").join("overrides"))
}

/// Split a prompt file into metadata and body
fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let content = content.trim();

    let rest = content.strip_prefix("---").ok_or_else(|| {
        Error::InvalidData("Prompt must start with YAML frontmatter (---)".into())
    })?;
    let end = rest.find("---").ok_or_else(|| {
        Error::InvalidData("Prompt frontmatter not closed (missing second ---)".into())
    })?;

    let metadata: PromptMetadata = serde_yaml::from_str(rest[..end].trim())
        .map_err(|e| Error::InvalidData(format!("Invalid prompt frontmatter: {}", e)))?;

    Ok((metadata, rest[end + 3..].trim().to_string()))
}

/// Extract a section from the prompt content
fn extract_section<'a>(content: &'a str, header: &str) -> Option<&'a str> {
    let start = content.find(header)?;
    let after_header = &content[start + header.len()..];
    let end = after_header.find("\n# ").unwrap_or(after_header.len());
    Some(after_header[..end].trim())
}

/// Resolve `{{#if var}}...{{/if}}` blocks
fn remove_unmatched_conditionals(content: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = content.to_string();

    while let Some(if_start) = result.find("{{#if ") {
        let var_start = if_start + 6;
        let Some(var_end) = result[var_start..].find("}}") else {
            break;
        };
        let var_name = result[var_start..var_start + var_end].trim().to_string();
        let block_start = var_start + var_end + 2;
        let Some(endif_pos) = result[block_start..].find("{{/if}}") else {
            break;
        };
        let block_end = block_start + endif_pos;

        let keep = vars.get(var_name.as_str()).is_some_and(|v| !v.is_empty());
        let replacement = if keep {
            result[block_start..block_end].to_string()
        } else {
            String::new()
        };
        result = format!("{}{}{}", &result[..if_start], replacement, &result[block_end + 7..]);
    }

    result
}
