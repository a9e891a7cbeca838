use crate::api::{ApiClient, ApiError, ChatMessage, Usage};
use crate::materialize::{MaterializeReport, Materializer};
use crate::registry::FileRegistry;

const SYSTEM_PROMPT: &str = "You are a code generation assistant producing a multi-file software \
project incrementally across several responses. Emit every file as a fenced code block preceded \
by a line of the form `File: relative/path.ext`. Use paths relative to the project root, include \
complete file contents rather than fragments, and avoid regenerating files that already exist \
unless they need changes.";

/// What one completed round produced, for display.
#[derive(Debug)]
pub struct RoundOutcome {
    pub round: u32,
    pub report: MaterializeReport,
    pub usage: Option<Usage>,
}

/// One generation session: conversation history, the file registry, and a
/// round counter, threaded explicitly between prompt building, the API call,
/// and materialization. All state lives for the process only.
pub struct Session {
    client: ApiClient,
    materializer: Materializer,
    registry: FileRegistry,
    history: Vec<ChatMessage>,
    round: u32,
}

impl Session {
    pub fn new(client: ApiClient, materializer: Materializer) -> Self {
        Self {
            client,
            materializer,
            registry: FileRegistry::new(),
            history: vec![ChatMessage::system(SYSTEM_PROMPT)],
            round: 0,
        }
    }

    pub fn registry(&self) -> &FileRegistry {
        &self.registry
    }

    pub fn rounds_completed(&self) -> u32 {
        self.round
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Continuation prompt embedding the registry summary, so the model keeps
    /// building on earlier rounds instead of duplicating them.
    pub fn next_prompt(&self) -> String {
        if self.registry.is_empty() {
            return "No files have been created yet. Please start generating the project files."
                .to_string();
        }
        format!(
            "I've generated the following files so far:\n{}\n\n\
             Please continue the code generation for the project. Focus on:\n\
             1. Implementing any missing functionality\n\
             2. Improving existing code if needed\n\
             3. Adding any necessary files that haven't been created yet\n\
             4. Ensuring everything works together cohesively\n\n\
             You can refer to the files I've already created. Please provide the next set of \
             files or updates.",
            self.registry.summary()
        )
    }

    /// One prompt/response cycle: send the prompt with full history, write
    /// whatever the response contains, record the exchange. An API failure
    /// aborts the round and leaves the history as it was.
    pub async fn run_round(&mut self, prompt: &str) -> Result<RoundOutcome, ApiError> {
        self.history.push(ChatMessage::user(prompt));
        let response = match self.client.send_message(&self.history).await {
            Ok(response) => response,
            Err(err) => {
                self.history.pop();
                return Err(err);
            }
        };

        self.round += 1;
        let report = self
            .materializer
            .materialize(&response.text, &mut self.registry, self.round);
        self.history.push(ChatMessage::assistant(&response.text));

        Ok(RoundOutcome {
            round: self.round,
            report,
            usage: response.usage,
        })
    }
}
