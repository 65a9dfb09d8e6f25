use crate::llm::StructuredSchema;
use crate::models::{CategoryLabel, ChecklistQuestion};

/// Label meaning the compliance topic was addressed
pub const ANSWER_YES: &str = "yes";
/// Label meaning the compliance topic was not addressed
pub const ANSWER_NO: &str = "no";

/// Labels offered for every compliance judgment
pub const ANSWER_LABELS: [&str; 2] = [ANSWER_YES, ANSWER_NO];

/// Name of the structured output used for evidence quotes
pub const QUOTE_SCHEMA_NAME: &str = "submit_quote";

/// Build the prompt asking which speaker is the bank consultant
pub fn build_consultant_prompt(transcript: &str, speakers: &[&str]) -> String {
    let mut prompt = String::new();

    prompt.push_str("You will receive a transcript of a phone call between a bank consultant and a client.\n");
    prompt.push_str(&format!(
        "Identify which speaker is the consultant. The speakers are: {}.\n\n",
        speakers.join(", ")
    ));
    prompt.push_str("The consultant works for the bank: they greet on behalf of the bank, explain products, ");
    prompt.push_str("read out mandatory notices and confirm orders. The client asks for or places orders.\n\n");
    prompt.push_str("# Transcript\n\n");
    prompt.push_str(transcript);
    prompt.push('\n');

    prompt
}

/// Build the prompt asking for the conversation category
pub fn build_category_prompt(transcript: &str, categories: &[CategoryLabel]) -> String {
    let mut prompt = String::new();

    prompt.push_str("You are a compliance analyst at a German bank. Assign the recorded customer call ");
    prompt.push_str("below to exactly one conversation type. Decide only by the content of the call: ");
    prompt.push_str("whether advice was given, which product types were discussed and which ");
    prompt.push_str("regulatory notices were read out.\n\n");

    prompt.push_str("# Conversation types\n\n");
    for (i, category) in categories.iter().enumerate() {
        prompt.push_str(&format!("{}. {}\n", i + 1, category));
    }
    prompt.push('\n');

    prompt.push_str("Calls \"Mit Beratung\" contain investment advice on the named product type; ");
    prompt.push_str("calls \"Ohne Beratung\" are orders the client places on their own responsibility.\n\n");

    prompt.push_str("# Transcript\n\n");
    prompt.push_str(transcript);
    prompt.push('\n');

    prompt
}

/// Build the yes/no prompt for one checklist question
///
/// The same text is sent for every try of a question.
pub fn build_compliance_prompt(question: &ChecklistQuestion, transcript: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str("You are a compliance analyst reviewing a call between a bank consultant and a client. ");
    prompt.push_str("Decide whether a required compliance topic was addressed in the call.\n\n");
    prompt.push_str(&format!(
        "Answer \"{ANSWER_YES}\" if the topic was addressed, or \"{ANSWER_NO}\" if it was not.\n\n"
    ));
    prompt.push_str("# Required topic\n\n");
    prompt.push_str(&format!("\"{}\"\n\n", question.description));
    prompt.push_str("# Transcript\n\n");
    prompt.push_str(transcript);
    prompt.push('\n');

    prompt
}

/// Build the prompt asking for the passage that covers a checklist question
pub fn build_evidence_prompt(question: &ChecklistQuestion, transcript: &str) -> String {
    let mut prompt = String::new();

    prompt.push_str("The following required compliance topic was addressed in the call transcript below.\n");
    prompt.push_str("Quote the passage of the transcript that addresses it. Copy the words exactly as ");
    prompt.push_str("they appear; do not paraphrase, translate or add speaker labels.\n\n");
    prompt.push_str("# Required topic\n\n");
    prompt.push_str(&format!("\"{}\"\n\n", question.description));
    prompt.push_str("# Transcript\n\n");
    prompt.push_str(transcript);
    prompt.push('\n');

    prompt
}

/// Schema for the evidence quote
pub fn quote_schema() -> StructuredSchema {
    StructuredSchema::new(
        QUOTE_SCHEMA_NAME,
        "Submit the literal transcript passage that addresses the topic",
        serde_json::json!({
            "type": "object",
            "properties": {
                "quote": {
                    "type": "string",
                    "description": "Verbatim passage from the transcript"
                }
            },
            "required": ["quote"],
            "additionalProperties": false
        }),
    )
}
