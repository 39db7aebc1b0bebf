//! Prompting Service
//!
//! Question-type classification, dynamic prompt construction over retrieved
//! context, completion post-processing, and the two out-of-document
//! signals. All of it is pure string work; the completer itself lives
//! behind the provider boundary.

pub mod templates;

use serde::Serialize;

use crate::retrieval::RetrievedChunk;

/// Leading phrases stripped from completions before anything else looks at
/// them.
const BOILERPLATE_PREFIXES: [&str; 7] = [
    "based on the provided context information,",
    "based on the provided context,",
    "based on the context,",
    "according to the context information,",
    "according to the context,",
    "i apologize, but",
    "i'm sorry, but",
];

/// Closed list of phrases whose presence marks an answer as ungrounded.
const NO_INFO_PHRASES: [&str; 9] = [
    "not available in the provided",
    "does not contain",
    "no information about",
    "no details about",
    "not mentioned in",
    "not found in",
    "i'm sorry",
    "i cannot find",
    "unable to find",
];

/// The seven question shapes the prompt adapts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    List,
    Definition,
    Comparison,
    How,
    Why,
    What,
    General,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::List => "list",
            QuestionType::Definition => "definition",
            QuestionType::Comparison => "comparison",
            QuestionType::How => "how",
            QuestionType::Why => "why",
            QuestionType::What => "what",
            QuestionType::General => "general",
        }
    }

    fn instructions(&self) -> &'static str {
        match self {
            QuestionType::List => templates::LIST_INSTRUCTIONS,
            QuestionType::Definition => templates::DEFINITION_INSTRUCTIONS,
            QuestionType::Comparison => templates::COMPARISON_INSTRUCTIONS,
            QuestionType::How => templates::HOW_INSTRUCTIONS,
            QuestionType::Why => templates::WHY_INSTRUCTIONS,
            QuestionType::What | QuestionType::General => templates::GENERAL_INSTRUCTIONS,
        }
    }
}

/// Classify a raw question by priority-ordered pattern matching. Matching
/// is lowercased and diacritic-insensitive; the first matching tag wins.
pub fn classify(question: &str) -> QuestionType {
    let q = fold_diacritics(&question.to_lowercase());
    let words: Vec<&str> = q.split_whitespace().collect();

    if q.contains("what are") || q.contains("list ") || q.contains("name ") || q.contains("enumerate")
    {
        return QuestionType::List;
    }
    if q.contains("what is") || q.contains("define") || q.contains("explain what") {
        return QuestionType::Definition;
    }
    if q.contains("difference between")
        || q.contains("compare")
        || q.contains("contrast")
        || words.iter().any(|w| *w == "vs" || *w == "vs.")
    {
        return QuestionType::Comparison;
    }
    if q.starts_with("how") {
        return QuestionType::How;
    }
    if q.starts_with("why") || q.contains("what causes") {
        return QuestionType::Why;
    }
    if q.starts_with("what") {
        return QuestionType::What;
    }
    QuestionType::General
}

/// Build a grounded prompt: role, type-specific instructions, the
/// source-marked context, then the question.
pub fn build_prompt(question: &str, question_type: QuestionType, chunks: &[RetrievedChunk]) -> String {
    let context = chunks
        .iter()
        .map(|c| {
            format!(
                "[Source: {}, p. {}]\n{}",
                c.filename, c.page_number, c.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "{role}\n\n{instructions}\n\nContext from the uploaded material:\n\n{context}\n\nQuestion: {question}",
        role = templates::ROLE_PROMPT,
        instructions = question_type.instructions(),
    )
}

/// Clean a raw completion: strip leading boilerplate, drop stray bold
/// markers, collapse newline runs, and capitalize the first character.
pub fn post_process(answer: &str) -> String {
    let mut processed = answer.trim().to_string();

    loop {
        let lower = processed.to_lowercase();
        let Some(prefix) = BOILERPLATE_PREFIXES.iter().find(|p| lower.starts_with(**p)) else {
            break;
        };
        processed = processed[prefix.len()..].trim_start().to_string();
    }

    // Bold markers come and go with model mood; headings and list bullets
    // survive this untouched.
    processed = processed.replace("**", "");

    while processed.contains("\n\n\n") {
        processed = processed.replace("\n\n\n", "\n\n");
    }

    let mut chars = processed.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Pre-signal: the retrieval set is empty or uniformly below the
/// similarity threshold.
pub fn is_low_similarity(chunks: &[RetrievedChunk], threshold: f32) -> bool {
    chunks.is_empty() || chunks.iter().all(|c| c.similarity < threshold)
}

/// Post-signal: the processed answer disclaims coverage.
pub fn indicates_missing_info(answer: &str) -> bool {
    let lower = answer.to_lowercase();
    NO_INFO_PHRASES.iter().any(|p| lower.contains(p))
}

/// Strip accents from the Latin characters that show up in study material,
/// so classification is diacritic-insensitive.
fn fold_diacritics(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}
