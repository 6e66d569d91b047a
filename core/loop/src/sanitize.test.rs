use super::*;

#[test]
fn short_strings_pass_through_unchanged() {
    let value = serde_json::json!({"path": "src/main.rs", "count": 3});
    assert_eq!(sanitize_for_log(&value), value);
}

#[test]
fn long_top_level_string_is_truncated() {
    let long = "x".repeat(600);
    let sanitized = sanitize_for_log(&serde_json::Value::String(long));
    let serde_json::Value::String(text) = sanitized else {
        panic!("expected string");
    };
    assert!(text.starts_with(&"x".repeat(500)));
    assert!(text.contains("truncated 100 more chars"));
}

#[test]
fn long_strings_nested_in_object_and_array_are_truncated() {
    let long = "y".repeat(700);
    let value = serde_json::json!({
        "content": long,
        "tags": [long, "short"],
    });
    let sanitized = sanitize_for_log(&value);
    let content = sanitized["content"].as_str().expect("content string");
    assert!(content.contains("truncated 200 more chars"));
    let first_tag = sanitized["tags"][0].as_str().expect("tag string");
    assert!(first_tag.contains("truncated 200 more chars"));
    assert_eq!(sanitized["tags"][1], serde_json::Value::String("short".to_string()));
}
