// Stream reconstruction tests - wire payloads through reconstruct()

use serde_json::json;
use vaultrelay_core::model::StreamEvent;
use vaultrelay_core::reconstruct::reconstruct;
use vaultrelay_core::types::ContentBlock;

/// SSE `data:` payloads of a reply that says something and then calls a tool.
const WIRE: &[&str] = &[
    r#"{"type":"message_start","message":{"id":"msg_01","type":"message","role":"assistant","content":[]}}"#,
    r#"{"type":"content_block_start","index":0,"content_block":{"type":"text","text":""}}"#,
    r#"{"type":"ping"}"#,
    r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Searching the "}}"#,
    r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"vault."}}"#,
    r#"{"type":"content_block_stop","index":0}"#,
    r#"{"type":"content_block_start","index":1,"content_block":{"type":"tool_use","id":"toolu_01","name":"search_vault","input":{}}}"#,
    r#"{"type":"content_block_delta","index":1,"delta":{"type":"input_json_delta","partial_json":""}}"#,
    r#"{"type":"content_block_delta","index":1,"delta":{"type":"input_json_delta","partial_json":"{\"query\": \"onto"}}"#,
    r#"{"type":"content_block_delta","index":1,"delta":{"type":"input_json_delta","partial_json":"logy\", \"limit\": 5}"}}"#,
    r#"{"type":"content_block_stop","index":1}"#,
    r#"{"type":"message_delta","delta":{"stop_reason":"tool_use","stop_sequence":null},"usage":{"output_tokens":42}}"#,
    r#"{"type":"message_stop"}"#,
];

fn wire_events(lines: &[&str]) -> Vec<StreamEvent> {
    lines
        .iter()
        .map(|line| serde_json::from_str(line).expect("valid stream event"))
        .collect()
}

#[test]
fn rebuilds_text_and_tool_use_from_wire_events() {
    let message = reconstruct(&wire_events(WIRE));

    assert_eq!(
        message.content,
        vec![
            ContentBlock::text("Searching the vault."),
            ContentBlock::ToolUse {
                id: "toolu_01".into(),
                name: "search_vault".into(),
                input: json!({ "query": "ontology", "limit": 5 }),
            },
        ]
    );
    assert!(message.parse_errors.is_empty());
}

#[test]
fn reconstruction_ignores_unknown_block_kinds() {
    let events = wire_events(&[
        r#"{"type":"content_block_start","index":0,"content_block":{"type":"thinking","thinking":""}}"#,
        r#"{"type":"content_block_delta","index":0,"delta":{"type":"thinking_delta","thinking":"hmm"}}"#,
        r#"{"type":"content_block_stop","index":0}"#,
        r#"{"type":"content_block_start","index":1,"content_block":{"type":"text","text":""}}"#,
        r#"{"type":"content_block_delta","index":1,"delta":{"type":"text_delta","text":"Done."}}"#,
        r#"{"type":"content_block_stop","index":1}"#,
    ]);
    assert_eq!(reconstruct(&events).content, vec![ContentBlock::text("Done.")]);
}

#[test]
fn truncated_arguments_surface_as_parse_error() {
    let events = wire_events(&[
        r#"{"type":"content_block_start","index":0,"content_block":{"type":"tool_use","id":"toolu_02","name":"dkg_create","input":{}}}"#,
        r#"{"type":"content_block_delta","index":0,"delta":{"type":"input_json_delta","partial_json":"{\"content\": {"}}"#,
        r#"{"type":"content_block_stop","index":0}"#,
    ]);
    let message = reconstruct(&events);

    assert_eq!(
        message.content,
        vec![ContentBlock::ToolUse {
            id: "toolu_02".into(),
            name: "dkg_create".into(),
            input: json!({}),
        }]
    );
    assert_eq!(message.parse_errors.len(), 1);
    assert_eq!(message.parse_errors[0].tool, "dkg_create");
}

#[test]
fn same_events_give_same_message() {
    let events = wire_events(WIRE);
    assert_eq!(reconstruct(&events), reconstruct(&events));
    assert!(reconstruct(&[]).content.is_empty());
}
