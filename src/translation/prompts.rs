/*!
 * Prompt builders for the translation stages.
 *
 * Every builder returns a ready `CompletionRequest`; the system prompt is
 * parameterized by language labels and an optional caller instruction that
 * is appended on its own line.
 */

use crate::language_utils::{language_label, source_language_label};
use crate::providers::CompletionRequest;

/// Sampling temperature for term extraction
pub const EXTRACTION_TEMPERATURE: f32 = 0.3;

const TRANSLATE_TEMPLATE: &str = "Translate the following {source_language} text into natural, fluent {target_language}. \
Make sure you fully understand the context before translating, and pay attention to cultural differences, tone and register.";

const REFINE_TEMPLATE: &str = "You are an expert translator. Improve the following initial {target_language} translation. \
Stay faithful to the original, including its details and meaning, while making the wording read more naturally.\n\
Work in three steps: analyse the intent and difficult passages of the original, identify problems in the initial translation, then produce the improved translation.\n\
Output only the improved translation, with no explanations unless they are strictly necessary.";

const EXTRACTION_PROMPT: &str = "You are a terminology extraction assistant. Extract the domain terms from the text the user provides and reply strictly in this JSON format:\n\
{ \"terms\": [\"term 1\", \"term 2\", \"term 3\"] }\n\
Do not add any explanation; output only a valid JSON object.";

fn with_instruction(mut prompt: String, instruction: Option<&str>) -> String {
    if let Some(extra) = instruction.map(str::trim).filter(|s| !s.is_empty()) {
        prompt.push('\n');
        prompt.push_str(extra);
    }
    prompt
}

/// Stage-1 system prompt
pub fn translation_system_prompt(
    source_language: Option<&str>,
    target_language: &str,
    instruction: Option<&str>,
) -> String {
    let prompt = TRANSLATE_TEMPLATE
        .replace("{source_language}", &source_language_label(source_language))
        .replace("{target_language}", &language_label(target_language));
    with_instruction(prompt, instruction)
}

/// Stage-2 system prompt
pub fn refinement_system_prompt(target_language: &str, instruction: Option<&str>) -> String {
    let prompt = REFINE_TEMPLATE.replace("{target_language}", &language_label(target_language));
    with_instruction(prompt, instruction)
}

/// Stage-2 user content: the original paragraph and the stage-1 output
pub fn refinement_user_content(original: &str, initial: &str) -> String {
    format!("Original: {}\nInitial translation: {}", original, initial)
}

/// Stage-1 request for a paragraph
pub fn translation_request(
    text: &str,
    source_language: Option<&str>,
    target_language: &str,
    instruction: Option<&str>,
    temperature: f32,
) -> CompletionRequest {
    CompletionRequest::new(
        translation_system_prompt(source_language, target_language, instruction),
        text,
        temperature,
    )
}

/// Stage-2 request refining `initial`
pub fn refinement_request(
    original: &str,
    initial: &str,
    target_language: &str,
    instruction: Option<&str>,
    temperature: f32,
) -> CompletionRequest {
    CompletionRequest::new(
        refinement_system_prompt(target_language, instruction),
        refinement_user_content(original, initial),
        temperature,
    )
}

/// JSON-mode request asking for the terms of one paragraph
pub fn extraction_request(paragraph: &str) -> CompletionRequest {
    CompletionRequest::new(EXTRACTION_PROMPT, paragraph, EXTRACTION_TEMPERATURE).json()
}
