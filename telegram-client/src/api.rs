use serde::{Deserialize, Serialize};

/// Envelope every Bot API method answers with.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
    #[serde(default)]
    pub parameters: Option<ResponseParameters>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseParameters {
    #[serde(default)]
    pub retry_after: Option<u64>,
    #[serde(default)]
    pub migrate_to_chat_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub date: i64,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub edited_message: Option<Message>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetUpdatesRequest {
    pub offset: i64,
    pub timeout: u64,
    pub allowed_updates: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    pub parse_mode: &'static str,
    pub disable_web_page_preview: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_updates_deserialization() {
        let raw = r#"{
            "ok": true,
            "result": [
                {"update_id": 10, "message": {
                    "message_id": 1, "date": 1717000000,
                    "chat": {"id": 42, "type": "private"},
                    "from": {"id": 42, "is_bot": false, "first_name": "A"},
                    "text": "/selling foo"
                }},
                {"update_id": 11, "message": {
                    "message_id": 2, "date": 1717000001,
                    "chat": {"id": -100, "type": "group"},
                    "sticker": {"file_id": "x"}
                }}
            ]
        }"#;

        let response: ApiResponse<Vec<Update>> = serde_json::from_str(raw).unwrap();
        assert!(response.ok);
        let updates = response.result.unwrap();
        assert_eq!(updates.len(), 2);
        let first = updates[0].message.as_ref().unwrap();
        assert_eq!(first.chat.id, 42);
        assert_eq!(first.chat.kind, "private");
        assert_eq!(first.text.as_deref(), Some("/selling foo"));
        assert!(updates[1].message.as_ref().unwrap().text.is_none());
    }

    #[test]
    fn test_error_response_deserialization() {
        let raw = r#"{"ok": false, "error_code": 429,
            "description": "Too Many Requests: retry after 5",
            "parameters": {"retry_after": 5}}"#;

        let response: ApiResponse<bool> = serde_json::from_str(raw).unwrap();
        assert!(!response.ok);
        assert_eq!(response.error_code, Some(429));
        assert_eq!(response.parameters.unwrap().retry_after, Some(5));
    }

    #[test]
    fn test_send_message_serialization() {
        let request = SendMessageRequest {
            chat_id: 7,
            text: "<b>hi</b>",
            parse_mode: "HTML",
            disable_web_page_preview: true,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["chat_id"], 7);
        assert_eq!(value["parse_mode"], "HTML");
        assert_eq!(value["disable_web_page_preview"], true);
    }
}
