use crate::models::{AspectRatio, OutputLanguage, RequestMode};

/// Instruction text for the model, chosen by the request mode.
pub fn build_prompt(mode: RequestMode, ratio: &AspectRatio) -> String {
    if mode.is_raw() {
        raw_prompt(mode.language(), ratio)
    } else {
        structured_prompt(mode.language(), ratio)
    }
}

fn raw_prompt(language: OutputLanguage, ratio: &AspectRatio) -> String {
    format!(
        "Analyze the image and generate a highly detailed, single-paragraph text prompt \
         for an AI image generator. The output must ONLY be the final prompt text and must \
         be in {language}. Include the following detail at the end of the prompt: \
         'aspect ratio: {ratio}'."
    )
}

fn structured_prompt(language: OutputLanguage, ratio: &AspectRatio) -> String {
    format!(
        r#"Analyze the image and generate a detailed description for an AI image generator.
The output must ONLY be a JSON object where all descriptive values are in {language}.
Use the following structure:
{{
  "baseDescription": {{
    "background": "...",
    "subjectDescription": "...",
    "visualStyle": "...",
    "lighting": "...",
    "characterTemplate": "..."
  }},
  "finalPrompt": "Combine all baseDescription fields into one cohesive text prompt for an AI image generator in {language}. Include the following detail at the end of the prompt: 'aspect ratio: {ratio}'."
}}"#
    )
}
