//! Prompt loader for built-in and on-disk YAML prompt definitions.

use crate::builder::build_prompt;
use crate::ids;
use crate::types::{BuiltPrompt, PromptDefinition};
use std::collections::HashMap;
use std::path::Path;
use verity_core::{AppError, AppResult};

const BUILTIN_SOURCES: [(&str, &str); 4] = [
    (ids::GRADE, include_str!("../prompts/engine.grade.yml")),
    (ids::VERIFY, include_str!("../prompts/engine.verify.yml")),
    (ids::REWRITE, include_str!("../prompts/engine.rewrite.yml")),
    (ids::GENERATE, include_str!("../prompts/engine.generate.yml")),
];

/// The set of prompt definitions an engine instance renders from.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    prompts: HashMap<String, PromptDefinition>,
}

impl PromptLibrary {
    /// Library containing only the compiled-in definitions.
    pub fn builtin() -> AppResult<Self> {
        let mut prompts = HashMap::new();
        for (id, source) in BUILTIN_SOURCES {
            let definition = parse_prompt(source, id)?;
            prompts.insert(definition.id.clone(), definition);
        }
        Ok(Self { prompts })
    }

    /// Built-in definitions, each replaced by `<dir>/<id>.yml` when that file exists.
    pub fn load(dir: Option<&Path>) -> AppResult<Self> {
        let mut library = Self::builtin()?;

        let Some(dir) = dir else {
            return Ok(library);
        };

        for id in list_prompts(dir)? {
            if !library.prompts.contains_key(&id) {
                tracing::debug!("Ignoring unknown prompt override: {}", id);
                continue;
            }
            let definition = load_prompt(dir, &id)?;
            tracing::info!("Using prompt override {} from {:?}", id, dir);
            library.prompts.insert(id, definition);
        }

        Ok(library)
    }

    /// Look up a definition by ID.
    pub fn get(&self, id: &str) -> AppResult<&PromptDefinition> {
        self.prompts
            .get(id)
            .ok_or_else(|| AppError::Prompt(format!("Unknown prompt: {}", id)))
    }

    /// Render the definition `id` with `variables`.
    pub fn render(&self, id: &str, variables: HashMap<String, String>) -> AppResult<BuiltPrompt> {
        build_prompt(self.get(id)?, variables)
    }
}

/// Load a prompt definition by ID from `<dir>/<id>.yml`.
pub fn load_prompt(dir: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = dir.join(format!("{}.yml", prompt_id));

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition = parse_prompt(&contents, &prompt_file.display().to_string())?;

    if definition.id != prompt_id {
        return Err(AppError::Prompt(format!(
            "Prompt file {:?} declares id '{}'",
            prompt_file, definition.id
        )));
    }

    Ok(definition)
}

/// List the prompt IDs available in `dir`.
pub fn list_prompts(dir: &Path) -> AppResult<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut prompt_ids = Vec::new();

    for entry in walkdir::WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("yml") {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                prompt_ids.push(stem.to_string());
            }
        }
    }

    prompt_ids.sort();
    Ok(prompt_ids)
}

fn parse_prompt(contents: &str, origin: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents)
        .map_err(|e| AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e)))?;

    validate_prompt(&definition)?;
    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.system.trim().is_empty() {
        return Err(AppError::Prompt(format!(
            "Prompt {} has an empty system message",
            def.id
        )));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(format!(
            "Prompt {} has an empty template",
            def.id
        )));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}
