//! Agent orchestrator
//!
//! Drives one session: send the history to the model, run whatever tools it
//! asks for, append the results, and repeat until the model stops asking.

use std::sync::Arc;

use crate::agent::accounting::SessionAccountant;
use crate::agent::loop_state::{AgentLoopState, LoopPhase, Outcome};
use crate::agent::session::Session;
use crate::core::{Config, DriverError, Message, Result, ToolDefinition};
use crate::llm::{MessageRequest, ModelClient, ModelResponse};
use crate::logging::SessionLogger;
use crate::tools::ToolDispatcher;

/// Main agent that orchestrates the model and tools
pub struct Agent {
    /// Configuration
    config: Config,
    /// Model service client
    client: Arc<dyn ModelClient>,
    /// Editor and shell for this session
    dispatcher: ToolDispatcher,
    /// Tool declarations sent with every request
    tools: Vec<ToolDefinition>,
    session: Session,
    accountant: SessionAccountant,
    state: AgentLoopState,
    log: SessionLogger,
}

impl Agent {
    /// Create an agent for `session`, building its tools from `config`
    pub fn new(config: Config, client: Arc<dyn ModelClient>, session: Session) -> Self {
        let log = SessionLogger::new(session.id());
        let dispatcher = ToolDispatcher::new(&config, &log);
        let tools = dispatcher.definitions();
        let accountant = SessionAccountant::new(config.pricing, log.component("accounting"));
        let state = AgentLoopState::new(config.agent.max_turns);

        Self {
            config,
            client,
            dispatcher,
            tools,
            session,
            accountant,
            state,
            log: log.component("agent"),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn accountant(&self) -> &SessionAccountant {
        &self.accountant
    }

    pub fn state(&self) -> &AgentLoopState {
        &self.state
    }

    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    /// Run the conversation loop for `prompt`.
    ///
    /// Token totals and costs are logged however the loop ends. Model-boundary
    /// failures are returned as errors after being logged.
    pub async fn run(&mut self, prompt: &str) -> Result<Outcome> {
        self.log.info(format!(
            "Starting session created at {} with model {} using {}",
            self.session.created_at().to_rfc3339(),
            self.config.anthropic.model,
            self.client.name()
        ));

        let result = self.drive(prompt).await;

        match &result {
            Ok(outcome) => self.log.info(format!("Session ended: {:?}", outcome)),
            Err(e) => {
                self.state.fail();
                self.log.error(format!("Session failed: {:?}", e));
            }
        }

        self.accountant.log_total_cost();
        result
    }

    async fn drive(&mut self, prompt: &str) -> Result<Outcome> {
        self.session.seed(prompt)?;
        self.state.advance(LoopPhase::AwaitResponse)?;

        loop {
            if !self.state.should_continue() {
                self.log
                    .warn(format!("Turn limit reached after {} turns", self.state.turn));
                self.state.advance(LoopPhase::Terminal)?;
                return Ok(Outcome::TurnLimit {
                    turns: self.state.turn,
                });
            }

            let response = self.send_request().await?;
            self.accountant
                .update_token_usage(response.usage.input_tokens, response.usage.output_tokens);
            self.session
                .push(Message::assistant(response.history_blocks()))?;
            self.state.next_turn();

            if !response.wants_tools() {
                let text = response.first_text().unwrap_or_default().to_string();
                self.log.info(format!(
                    "Model finished on turn {} ({:?})",
                    self.state.turn, response.stop_reason
                ));
                self.state.advance(LoopPhase::Terminal)?;
                return Ok(Outcome::Completed { text });
            }

            let tool_calls = self
                .session
                .last()
                .map(Message::tool_calls)
                .unwrap_or_default();
            if tool_calls.is_empty() {
                return Err(DriverError::api(
                    "Response stopped for tool use but contained no tool calls",
                ));
            }

            self.state.advance(LoopPhase::DispatchTool)?;
            let halt_on_error = self.config.agent.halt_on_tool_error;
            let results = self
                .dispatcher
                .dispatch_all(&tool_calls, halt_on_error)
                .await;
            let first_error = results
                .iter()
                .find(|result| result.is_error)
                .map(|result| (result.tool_use_id.clone(), result.text().to_string()));

            self.state.advance(LoopPhase::AppendResult)?;
            self.session.push(Message::tool_results(results))?;

            if let (true, Some((tool_use_id, error))) = (halt_on_error, first_error) {
                self.log
                    .warn(format!("Halting after tool error in {}: {}", tool_use_id, error));
                self.state.advance(LoopPhase::Terminal)?;
                return Ok(Outcome::HaltedOnToolError { tool_use_id, error });
            }

            self.state.advance(LoopPhase::AwaitResponse)?;
        }
    }

    async fn send_request(&self) -> Result<ModelResponse> {
        let request = MessageRequest {
            model: &self.config.anthropic.model,
            max_tokens: self.config.anthropic.max_tokens,
            system: self.config.agent.system_prompt.as_deref(),
            messages: self.session.messages(),
            tools: &self.tools,
        };

        self.log.debug(format!(
            "Turn {}: sending {} messages",
            self.state.turn + 1,
            request.messages.len()
        ));

        self.client.create_message(&request).await
    }
}
