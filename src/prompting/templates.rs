//! Prompt Templates
//!
//! Fixed text blocks assembled by the prompting service. One formatting
//! paragraph per question type; the role line is shared by every grounded
//! prompt.

/// Role section, first in every grounded prompt.
pub const ROLE_PROMPT: &str = "You are an educational assistant helping a student understand \
their uploaded study material. Ground your answer in the context supplied below and cite \
details from it rather than outside knowledge.";

pub const LIST_INSTRUCTIONS: &str = "The student wants an enumeration. Present the relevant \
items as a bulleted list, one item per line with a short explanation after each, and draw \
every item from the context.";

pub const DEFINITION_INSTRUCTIONS: &str = "The student wants a definition. Open with a \
concise one-or-two sentence definition, then elaborate with the key characteristics and any \
examples the context provides.";

pub const COMPARISON_INSTRUCTIONS: &str = "The student wants a comparison. Organize the \
answer as paired points: first the similarities, then the differences, each as its own short \
list grounded in the context.";

pub const HOW_INSTRUCTIONS: &str = "The student wants a procedure. Answer as an ordered \
sequence of steps, each step on its own line with enough detail from the context to follow \
it.";

pub const WHY_INSTRUCTIONS: &str = "The student wants an explanation of causes. Present the \
causal chain in order, from the most important reason to the least, and make the \
cause-effect links explicit.";

pub const GENERAL_INSTRUCTIONS: &str = "Answer with a brief direct response first, then a \
more detailed explanation with the key points from the context, using lists where they help \
clarity.";

/// Prompt used when the engine answers without grounding.
pub fn fallback_prompt(question: &str) -> String {
    format!(
        "A student asked: \"{question}\"\n\n\
         The requested information is NOT available in the uploaded materials. Answer the \
         question from your general knowledge, and open your response with a single line \
         stating that this information is not in the uploaded materials before giving the \
         answer.\n\nAnswer:"
    )
}
