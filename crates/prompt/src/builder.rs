//! Prompt builder for rendering templates.

use crate::types::{BuiltPrompt, PromptDefinition};
use handlebars::Handlebars;
use std::collections::HashMap;
use verity_core::{AppError, AppResult};

/// Build a prompt from a definition and input variables.
///
/// Both the system message and the user template are rendered with the same
/// variables. Missing variables render as empty strings.
///
/// # Example
/// ```
/// use std::collections::HashMap;
/// use verity_prompt::{build_prompt, ids, PromptLibrary};
///
/// let library = PromptLibrary::builtin().unwrap();
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "What is Rust?".to_string());
/// vars.insert("context".to_string(), "[1] Rust is a language.".to_string());
///
/// let built = build_prompt(library.get(ids::GENERATE).unwrap(), vars).unwrap();
/// assert!(built.user.contains("What is Rust?"));
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::trace!("Building prompt: {}", definition.id);

    let system = render_template(&definition.system, &variables)?;
    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt::new(
        system.trim_end().to_string(),
        user.trim_end().to_string(),
        definition.id.clone(),
        variables,
    ))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Passages and answers are plain text, never HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
