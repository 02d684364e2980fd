//! Format-specific prompt templates.
//!
//! One closed table: [`build`] maps every [`ArtifactFormat`] to its prompt,
//! exhaustively matched so adding a format is a compile-time obligation.
//! Structured formats instruct the model to return bare JSON; incidental
//! code-fence wrapping is stripped downstream before validation.

use crate::material::ArtifactFormat;

/// Number of questions requested for the bulk quiz pass.
pub const QUIZ_QUESTIONS: usize = 5;
/// Number of flashcards requested per generation.
pub const FLASHCARD_COUNT: usize = 10;

/// Build the generation prompt for one format.
pub fn build(format: ArtifactFormat, title: &str, content: &str) -> String {
    match format {
        ArtifactFormat::Notes => format!(
            "Create structured study notes for the following material.\n\n\
             Title: {title}\n\nMaterial:\n{content}\n\n\
             Requirements:\n\
             1. Identify the main topics and subtopics\n\
             2. Use bullet lists\n\
             3. Highlight key definitions\n\
             4. Add examples where helpful\n\
             5. Preserve the logical structure\n\n\
             Format: Markdown with ## headings, - lists, and **bold** emphasis."
        ),
        ArtifactFormat::Summary => format!(
            "Write a short summary (TL;DR) of this material in 3-5 sentences.\n\n\
             Material:\n{content}\n\n\
             Focus on what matters most. Be concrete."
        ),
        ArtifactFormat::Quiz => format!(
            "Create a quiz of {QUIZ_QUESTIONS} questions about the material.\n\n\
             Material:\n{content}\n\n\
             Requirements:\n\
             1. Mix question types: definitions, comprehension, application\n\
             2. 30% easy, 50% medium, 20% hard\n\
             3. Plausible distractors\n\n\
             JSON format:\n\
             {{\n  \"questions\": [\n    {{\n      \"question\": \"...?\",\n      \
             \"options\": [\"A) ...\", \"B) ...\", \"C) ...\", \"D) ...\"],\n      \
             \"correct\": 0,\n      \"explanation\": \"...\",\n      \
             \"difficulty\": \"easy|medium|hard\"\n    }}\n  ]\n}}\n\n\
             Create exactly {QUIZ_QUESTIONS} questions. Return ONLY valid JSON."
        ),
        ArtifactFormat::Glossary => format!(
            "Create a glossary of the key terms.\n\n\
             Material:\n{content}\n\n\
             JSON format:\n\
             {{\n  \"terms\": [\n    {{\n      \"term\": \"...\",\n      \
             \"definition\": \"... with an example\"\n    }}\n  ]\n}}\n\n\
             Find 10-20 important terms. Return ONLY JSON."
        ),
        ArtifactFormat::Flashcards => format!(
            "Create {FLASHCARD_COUNT} flashcards.\n\n\
             Material:\n{content}\n\n\
             JSON format:\n\
             {{\n  \"cards\": [\n    {{\n      \"front\": \"question or term\",\n      \
             \"back\": \"answer or definition\"\n    }}\n  ]\n}}\n\n\
             Create at LEAST {FLASHCARD_COUNT} cards. Return ONLY JSON."
        ),
        ArtifactFormat::Script => format!(
            "Write a two-host podcast script discussing the following material.\n\n\
             Title: {title}\n\nMaterial:\n{content}\n\n\
             Requirements:\n\
             1. Conversational tone, hosts named Alex and Sam\n\
             2. Cover every major concept of the material\n\
             3. End with a short recap of the key takeaways\n\n\
             Format: plain text, one line per speaker turn, prefixed with the host name."
        ),
    }
}
