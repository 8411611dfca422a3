use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WizardError};
use crate::models::AISettings;

// ─── Types ───

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatRecvMessage,
}

#[derive(Deserialize)]
struct ChatRecvMessage {
    content: Option<String>,
}

// ─── Client seam ───

/// Chat-completion backend. One attempt per call, no retry.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Whether a request could be attempted at all (an API key is present).
    fn is_configured(&self) -> bool;

    /// Returns `choices[0].message.content`, unparsed.
    async fn complete(&self, messages: &[ChatMessage], max_tokens: Option<u32>) -> Result<String>;
}

pub struct HttpChatClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f32,
    api_key: String,
}

impl HttpChatClient {
    pub fn new(settings: &AISettings) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            temperature: settings.temperature,
            api_key: settings.api_key.trim().to_string(),
        }
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn complete(&self, messages: &[ChatMessage], max_tokens: Option<u32>) -> Result<String> {
        if !self.is_configured() {
            return Err(WizardError::configuration("Please enter an API key"));
        }

        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
            max_tokens,
        };

        log::debug!("POST {} ({} messages)", self.endpoint, messages.len());
        let response = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| WizardError::transport(format!("API request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WizardError::status(status.as_u16(), body));
        }

        let body_text = response
            .text()
            .await
            .map_err(|e| WizardError::transport(format!("Failed to read response: {}", e)))?;

        extract_content(&body_text)
    }
}

/// Pulls the first choice's text out of a chat-completion body.
pub fn extract_content(body: &str) -> Result<String> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| WizardError::parse(format!("Failed to parse API response: {}", e)))?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or_else(|| WizardError::parse("Invalid response format from API: no content"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    fn client_for(endpoint: String) -> HttpChatClient {
        let settings = AISettings {
            api_key: "sk-test".into(),
            endpoint,
            ..AISettings::default()
        };
        HttpChatClient {
            http: reqwest::Client::builder().no_proxy().build().unwrap(),
            ..HttpChatClient::new(&settings)
        }
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
                continue;
            };
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let body_len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + body_len {
                break;
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Answers one request with `status_line` and `body`, yielding the raw request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            request
        });
        (format!("http://{}/v1/chat/completions", addr), handle)
    }

    #[tokio::test]
    async fn success_returns_first_choice_and_sends_headers() {
        let (endpoint, server) =
            serve_once("HTTP/1.1 200 OK", r#"{"choices":[{"message":{"role":"assistant","content":"[]"}}]}"#).await;
        let client = client_for(endpoint);

        let content = client.complete(&[ChatMessage::user("hi")], Some(500)).await.unwrap();
        assert_eq!(content, "[]");

        let request = server.await.unwrap();
        let lowered = request.to_lowercase();
        assert!(request.starts_with("POST /v1/chat/completions "));
        assert!(lowered.contains("authorization: bearer sk-test"));
        assert!(lowered.contains("content-type: application/json"));
        assert!(request.contains(r#""model":"gpt-4""#));
        assert!(request.contains(r#""max_tokens":500"#));
    }

    #[tokio::test]
    async fn non_success_status_is_a_network_error_with_code() {
        let (endpoint, server) = serve_once("HTTP/1.1 503 Service Unavailable", r#"{"error":"busy"}"#).await;
        let client = client_for(endpoint);

        let err = client.complete(&[ChatMessage::user("hi")], None).await.unwrap_err();
        match &err {
            WizardError::Network { status, message } => {
                assert_eq!(*status, Some(503));
                assert!(message.contains("busy"));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(err.user_message(), "API error: 503");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = client_for(format!("http://{}/v1/chat/completions", addr));

        let err = client.complete(&[ChatMessage::user("hi")], None).await.unwrap_err();
        assert!(matches!(err, WizardError::Network { status: None, .. }));
        assert!(err.user_message().starts_with("Network failure"));
    }

    #[tokio::test]
    async fn garbage_body_on_success_is_a_parse_error() {
        let (endpoint, server) = serve_once("HTTP/1.1 200 OK", "<html>oops</html>").await;
        let client = client_for(endpoint);

        let err = client.complete(&[ChatMessage::user("hi")], None).await.unwrap_err();
        assert!(matches!(err, WizardError::Parse(_)));
        server.await.unwrap();
    }

    #[test]
    fn request_body_matches_wire_format() {
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("hi")];
        let request = ChatRequest {
            model: "gpt-4",
            messages: &messages,
            temperature: 0.7,
            max_tokens: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "gpt-4");
        assert_eq!(value["messages"][1]["role"], "user");
        assert_eq!(value["messages"][1]["content"], "hi");
        assert!(value.get("max_tokens").is_none());

        let capped = ChatRequest {
            max_tokens: Some(500),
            ..request
        };
        assert_eq!(serde_json::to_value(&capped).unwrap()["max_tokens"], 500);
    }

    #[test]
    fn extract_content_reads_first_choice() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"[]"}},{"message":{"content":"x"}}]}"#;
        assert_eq!(extract_content(body).unwrap(), "[]");
    }

    #[test]
    fn extract_content_rejects_bad_envelopes() {
        assert!(matches!(extract_content("not json"), Err(WizardError::Parse(_))));
        assert!(matches!(extract_content(r#"{"choices":[]}"#), Err(WizardError::Parse(_))));
        assert!(matches!(
            extract_content(r#"{"choices":[{"message":{"content":null}}]}"#),
            Err(WizardError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let settings = AISettings {
            api_key: "   ".into(),
            // Never contacted.
            endpoint: "http://127.0.0.1:9/v1/chat/completions".into(),
            ..AISettings::default()
        };
        let client = HttpChatClient::new(&settings);
        assert!(!client.is_configured());
        let err = client.complete(&[ChatMessage::user("hi")], None).await.unwrap_err();
        assert!(matches!(err, WizardError::Configuration(_)));
    }
}
