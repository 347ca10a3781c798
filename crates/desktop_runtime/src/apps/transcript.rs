//! Conversation state of a chat pane, folded from streamed agent events.

use agent_stream_contract::{ChatMessage, ChatRole, StreamEvent};

#[derive(Debug, Clone, PartialEq)]
pub struct ToolActivity {
    pub tool: String,
    /// Seconds reported by the latest progress event, if any.
    pub elapsed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptMessage {
    pub role: ChatRole,
    pub content: String,
    pub tools: Vec<ToolActivity>,
    pub error: Option<String>,
}

impl TranscriptMessage {
    fn new(role: ChatRole, content: String) -> Self {
        Self {
            role,
            content,
            tools: Vec::new(),
            error: None,
        }
    }

    fn is_blank(&self) -> bool {
        self.content.is_empty() && self.tools.is_empty() && self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum TranscriptStatus {
    #[default]
    Idle,
    Streaming,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transcript {
    pub messages: Vec<TranscriptMessage>,
    pub status: TranscriptStatus,
}

impl Transcript {
    pub fn is_streaming(&self) -> bool {
        self.status == TranscriptStatus::Streaming
    }

    /// Appends a user turn and an empty assistant turn that streamed events fill in.
    ///
    /// Returns `false` without changes when `text` is blank or a response is still streaming.
    pub fn push_user(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() || self.is_streaming() {
            return false;
        }
        self.messages
            .push(TranscriptMessage::new(ChatRole::User, text.to_string()));
        self.messages
            .push(TranscriptMessage::new(ChatRole::Assistant, String::new()));
        self.status = TranscriptStatus::Streaming;
        true
    }

    /// Conversation to send to the endpoint: every non-empty turn, oldest first.
    pub fn request_messages(&self) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .filter(|message| !message.content.trim().is_empty())
            .map(|message| ChatMessage {
                role: message.role,
                content: message.content.clone(),
            })
            .collect()
    }

    pub fn apply(&mut self, event: &StreamEvent) {
        match event {
            StreamEvent::TextDelta { text } => {
                self.current_reply().content.push_str(text);
            }
            StreamEvent::ToolStart { tool } => {
                self.current_reply().tools.push(ToolActivity {
                    tool: tool.clone(),
                    elapsed: None,
                });
            }
            StreamEvent::ToolProgress { tool, elapsed } => {
                let reply = self.current_reply();
                match reply.tools.iter_mut().rev().find(|a| &a.tool == tool) {
                    Some(activity) => activity.elapsed = Some(*elapsed),
                    None => reply.tools.push(ToolActivity {
                        tool: tool.clone(),
                        elapsed: Some(*elapsed),
                    }),
                }
            }
            StreamEvent::Done => self.status = TranscriptStatus::Idle,
            StreamEvent::Error { message } => self.fail(message.clone()),
        }
    }

    /// Records a failure on the in-flight reply.
    pub fn fail(&mut self, message: String) {
        self.current_reply().error = Some(message.clone());
        self.status = TranscriptStatus::Failed(message);
    }

    /// Closes the in-flight reply once the stream has ended, dropping it if nothing arrived.
    pub fn finish(&mut self) {
        if self.is_streaming() {
            self.status = TranscriptStatus::Idle;
        }
        if self
            .messages
            .last()
            .is_some_and(|m| m.role == ChatRole::Assistant && m.is_blank())
        {
            self.messages.pop();
        }
    }

    fn current_reply(&mut self) -> &mut TranscriptMessage {
        let needs_reply = self
            .messages
            .last()
            .map_or(true, |m| m.role != ChatRole::Assistant);
        if needs_reply {
            self.messages
                .push(TranscriptMessage::new(ChatRole::Assistant, String::new()));
        }
        let last = self.messages.len() - 1;
        &mut self.messages[last]
    }
}
