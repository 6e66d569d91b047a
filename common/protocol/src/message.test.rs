use super::*;

#[test]
fn text_content_round_trips_through_json() {
    let message = Message::user("hello");
    let json = serde_json::to_string(&message).expect("serialize");
    let back: Message = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back.content.char_len(), 5);
}

#[test]
fn tool_use_and_result_ids_are_extracted() {
    let assistant = Message::assistant(Content::Blocks(vec![ContentBlock::ToolUse {
        tool_use_id: "call-1".to_string(),
        tool_name: "read_file".to_string(),
        input: serde_json::json!({"path": "a.rs"}),
    }]));
    assert_eq!(assistant.tool_use_ids(), vec!["call-1".to_string()]);

    let user = Message::user(Content::Blocks(vec![ContentBlock::ToolResult {
        tool_use_id: "call-1".to_string(),
        output: "contents".to_string(),
        success: true,
    }]));
    assert_eq!(user.tool_result_ids(), vec!["call-1".to_string()]);
}

#[test]
fn blocks_char_len_sums_text_and_tool_payloads() {
    let message = Message::user(Content::Blocks(vec![
        ContentBlock::Text { text: "abcd".to_string() },
        ContentBlock::Image {
            data: "base64==".to_string(),
            media_type: "image/png".to_string(),
        },
    ]));
    assert_eq!(message.content.char_len(), 4);
}
