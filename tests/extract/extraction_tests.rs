// JSON extraction tests - pulling the payload out of a drafted answer

use vaultrelay_core::extract::{ExtractionError, extract_json};

#[test]
fn extracts_fenced_json_from_model_answer() {
    let answer = "Here is the knowledge asset:\n\n```json\n{\n  \"@context\": \"https://schema.org\",\n  \"agent_id\": \"OntologyLink\"\n}\n```\n\nLet me know if anything should change.";
    let payload = extract_json(answer).expect("payload");
    assert_eq!(
        payload,
        "{\n  \"@context\": \"https://schema.org\",\n  \"agent_id\": \"OntologyLink\"\n}"
    );
    let value: serde_json::Value = serde_json::from_str(payload).expect("valid json");
    assert_eq!(value["agent_id"], "OntologyLink");
}

#[test]
fn extracts_bare_object_between_outer_braces() {
    let answer = "Result {\"name\": \"note\", \"tags\": {\"a\": 1}} as requested";
    assert_eq!(
        extract_json(answer),
        Ok("{\"name\": \"note\", \"tags\": {\"a\": 1}}")
    );
}

#[test]
fn fence_without_json_tag_falls_back_to_braces() {
    let answer = "```\n{\"plain\": true}\n```";
    assert_eq!(extract_json(answer), Ok("{\"plain\": true}"));
}

#[test]
fn answer_without_object_is_an_error() {
    assert_eq!(extract_json("I could not find anything."), Err(ExtractionError));
    assert_eq!(extract_json(""), Err(ExtractionError));
}
