//! Reasoning Loop
//!
//! Bounded think/act/observe loop. Each step renders the prompt, streams a
//! completion, parses it into an [`Action`] and either dispatches a tool or
//! stops. Tool failures become observations; parse and provider failures end
//! the run with an error; running out of steps is a reported outcome.

use std::sync::Arc;

use futures::StreamExt;
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::error::{AgentError, Result};
use crate::memory::{MemoryWindow, TokenCounter};
use crate::message::Message;
use crate::prompt::{self, PromptTemplate};
use crate::provider::{GenerationOptions, LlmProvider, ProviderTokenCounter};
use crate::tool::{Tool, ToolRegistry};

/// Label placed before each observation in the transcript
pub const OBSERVATION_MARKER: &str = "Observation:";

/// Synthetic turn every run's memory starts with
const SEED_INPUT: &str = "\ninit";
const SEED_OUTPUT: &str = "\nstart";

/// Message returned when the step budget runs out
pub const EXHAUSTED_MESSAGE: &str =
    "Reached the maximum number of thought steps without completing the task";

const DEFAULT_PROMPT: &str = r"You are a helpful assistant that completes tasks by calling tools.

Available tools:
{tools}

Task:
{task_description}

Progress so far:
{memory}

Decide the next action. Call one tool at a time. When the task is complete,
respond with the action name FINISH.

{format_instructions}
";

const DEFAULT_FINAL_PROMPT: &str = r"Task:
{task_description}

Work log:
{memory}

Write the final answer for the task based on the work log.
";

/// Agent configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum think/act cycles before the run is reported as exhausted
    pub max_steps: usize,

    /// Token budget for the memory window
    pub memory_token_budget: usize,

    /// Generation options for every model call
    pub generation: GenerationOptions,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: 10,
            memory_token_budget: 4000,
            generation: GenerationOptions::default(),
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_steps == 0 {
            return Err(AgentError::Config("max_steps must be at least 1".into()));
        }
        if self.memory_token_budget == 0 {
            return Err(AgentError::Config("memory_token_budget must be at least 1".into()));
        }
        Ok(())
    }
}

/// Terminal output of a run: `{"result": ...}` or `{"error": ...}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunResult {
    Finished { result: String },
    Exhausted { error: String },
}

impl RunResult {
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }

    /// The reply on success, the error text otherwise
    pub fn text(&self) -> &str {
        match self {
            Self::Finished { result } => result,
            Self::Exhausted { error } => error,
        }
    }
}

/// Hooks for watching a run as it progresses. All methods default to no-ops.
pub trait StepObserver: Send + Sync {
    fn on_step_start(&self, _step: usize) {}

    /// Called for every streamed token
    fn on_token(&self, _token: &str) {}

    fn on_action(&self, _step: usize, _action: &Action) {}

    fn on_observation(&self, _step: usize, _observation: &str) {}
}

pub struct NoopObserver;

impl StepObserver for NoopObserver {}

/// Logs run progress through `tracing`
pub struct TracingObserver;

impl StepObserver for TracingObserver {
    fn on_step_start(&self, step: usize) {
        tracing::debug!(step, "Thinking");
    }

    fn on_token(&self, token: &str) {
        tracing::trace!(token, "Token");
    }

    fn on_action(&self, step: usize, action: &Action) {
        tracing::debug!(step, action = %action.name, args = %action.args_json(), "Action chosen");
    }

    fn on_observation(&self, step: usize, observation: &str) {
        tracing::debug!(step, observation, "Observation");
    }
}

enum LoopState {
    Thinking,
    Acting { action: Action, response: String },
    Finished,
    Exhausted,
}

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    prompt: PromptTemplate,
    final_prompt: PromptTemplate,
    config: AgentConfig,
    counter: Arc<dyn TokenCounter>,
    observer: Arc<dyn StepObserver>,
}

impl Agent {
    /// Create a new agent.
    ///
    /// `prompt` may use `{tools}`, `{format_instructions}`,
    /// `{task_description}` and `{memory}`; `final_prompt` may use
    /// `{task_description}` and `{memory}`.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        prompt: &str,
        final_prompt: &str,
        config: AgentConfig,
    ) -> Result<Self> {
        config.validate()?;
        let step_prompt = prompt::render(prompt, &tools.catalogue(), &Action::format_instructions());

        Ok(Self {
            counter: Arc::new(ProviderTokenCounter(provider.clone())),
            provider,
            tools,
            prompt: step_prompt,
            final_prompt: PromptTemplate::new(final_prompt),
            config,
            observer: Arc::new(NoopObserver),
        })
    }

    /// Replace the step observer
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn StepObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Replace how memory turns are measured
    #[must_use]
    pub fn with_token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = counter;
        self
    }

    /// Run the loop for one task.
    ///
    /// Errors only on provider failures and unparseable model output.
    pub async fn run(&self, task_description: &str) -> Result<RunResult> {
        let mut memory = MemoryWindow::new(self.config.memory_token_budget, self.counter.clone());
        memory.append(SEED_INPUT, SEED_OUTPUT);

        tracing::info!(max_steps = self.config.max_steps, "Agent run started");

        let mut steps = 0;
        let mut state = LoopState::Thinking;

        loop {
            state = match state {
                LoopState::Thinking if steps >= self.config.max_steps => LoopState::Exhausted,
                LoopState::Thinking => {
                    self.observer.on_step_start(steps);
                    let (action, response) = self.step(task_description, &memory).await?;
                    self.observer.on_action(steps, &action);

                    if action.is_finish() {
                        LoopState::Finished
                    } else {
                        LoopState::Acting { action, response }
                    }
                }
                LoopState::Acting { action, response } => {
                    tracing::debug!(step = steps, tool = %action.name, "Dispatching tool");
                    let observation = self.tools.invoke(&action.name, &action.args).await;
                    self.observer.on_observation(steps, &observation);

                    memory.append(response, format!("\n{OBSERVATION_MARKER}\n{observation}"));
                    steps += 1;
                    LoopState::Thinking
                }
                LoopState::Finished => {
                    tracing::info!(steps, "Agent finished, synthesizing reply");
                    let reply = self.synthesize(task_description, &memory).await?;
                    return Ok(RunResult::Finished { result: reply });
                }
                LoopState::Exhausted => {
                    tracing::info!(steps, "Agent exhausted its step budget");
                    return Ok(RunResult::Exhausted {
                        error: EXHAUSTED_MESSAGE.into(),
                    });
                }
            };
        }
    }

    /// One think step: render, stream, parse
    async fn step(&self, task_description: &str, memory: &MemoryWindow) -> Result<(Action, String)> {
        let transcript = memory.render_text();
        let prompt = self.prompt.format(&[
            ("task_description", task_description),
            ("memory", &transcript),
        ]);

        let mut stream = self
            .provider
            .complete_stream(&[Message::user(prompt)], &self.config.generation)
            .await?;

        let mut response = String::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if !chunk.delta.is_empty() {
                self.observer.on_token(&chunk.delta);
                response.push_str(&chunk.delta);
            }
            if chunk.done {
                break;
            }
        }

        let action = Action::parse(&response)?;
        Ok((action, response))
    }

    /// The uncounted final call; output is returned verbatim
    async fn synthesize(&self, task_description: &str, memory: &MemoryWindow) -> Result<String> {
        let transcript = memory.render_text();
        let prompt = self.final_prompt.format(&[
            ("task_description", task_description),
            ("memory", &transcript),
        ]);

        let completion = self
            .provider
            .complete(&[Message::user(prompt)], &self.config.generation)
            .await?;
        Ok(completion.content)
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get configuration
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    registry: ToolRegistry,
    pending: Vec<Arc<dyn Tool>>,
    prompt: String,
    final_prompt: String,
    config: AgentConfig,
    observer: Option<Arc<dyn StepObserver>>,
    counter: Option<Arc<dyn TokenCounter>>,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            registry: ToolRegistry::new(),
            pending: Vec::new(),
            prompt: DEFAULT_PROMPT.into(),
            final_prompt: DEFAULT_FINAL_PROMPT.into(),
            config: AgentConfig::default(),
            observer: None,
            counter: None,
        }
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Add a tool; name clashes are reported by [`AgentBuilder::build`]
    #[must_use]
    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.pending.push(Arc::new(tool));
        self
    }

    #[must_use]
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.registry = tools;
        self
    }

    #[must_use]
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn final_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.final_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    #[must_use]
    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    #[must_use]
    pub fn max_steps(mut self, max: usize) -> Self {
        self.config.max_steps = max;
        self
    }

    #[must_use]
    pub fn memory_token_budget(mut self, tokens: usize) -> Self {
        self.config.memory_token_budget = tokens;
        self
    }

    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn StepObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    #[must_use]
    pub fn token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = Some(counter);
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        let mut registry = self.registry;
        for tool in self.pending {
            registry.register_shared(tool)?;
        }

        let mut agent = Agent::new(
            provider,
            Arc::new(registry),
            &self.prompt,
            &self.final_prompt,
            self.config,
        )?;
        if let Some(observer) = self.observer {
            agent = agent.with_observer(observer);
        }
        if let Some(counter) = self.counter {
            agent = agent.with_token_counter(counter);
        }
        Ok(agent)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::{Map, Value, json};

    use super::*;
    use crate::provider::{Completion, CompletionStream, ModelInfo, StreamChunk};
    use crate::tool::{ParameterSchema, TOOL_NOT_FOUND, ToolResult, ToolSchema};

    /// Replays canned step responses, then repeats `fallback` forever
    struct ScriptedProvider {
        script: Mutex<VecDeque<String>>,
        fallback: String,
        stream_calls: AtomicUsize,
        complete_calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
        fail_stream: bool,
    }

    impl ScriptedProvider {
        fn new(script: &[&str], fallback: &str) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.iter().map(ToString::to_string).collect()),
                fallback: fallback.into(),
                stream_calls: AtomicUsize::new(0),
                complete_calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
                fail_stream: false,
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                fail_stream: true,
                ..Arc::into_inner(Self::new(&[], "")).unwrap()
            })
        }

        fn stream_calls(&self) -> usize {
            self.stream_calls.load(Ordering::SeqCst)
        }

        fn complete_calls(&self) -> usize {
            self.complete_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn complete(&self, messages: &[Message], options: &GenerationOptions) -> Result<Completion> {
            self.complete_calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(messages[0].content.clone());
            Ok(Completion {
                content: "final retention plan".into(),
                model: options.model.clone(),
                usage: None,
            })
        }

        async fn complete_stream(
            &self,
            messages: &[Message],
            _options: &GenerationOptions,
        ) -> Result<CompletionStream> {
            self.stream_calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(messages[0].content.clone());

            if self.fail_stream {
                let chunks = vec![
                    Ok(StreamChunk { delta: "{\"na".into(), done: false, usage: None }),
                    Err(AgentError::Provider("connection reset".into())),
                ];
                return Ok(Box::pin(futures::stream::iter(chunks)));
            }

            let text = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone());
            let mut chunks: Vec<Result<StreamChunk>> = text
                .split_inclusive(' ')
                .map(|piece| Ok(StreamChunk { delta: piece.to_string(), done: false, usage: None }))
                .collect();
            chunks.push(Ok(StreamChunk { delta: String::new(), done: true, usage: None }));
            Ok(Box::pin(futures::stream::iter(chunks)))
        }

        async fn list_models(&self) -> Result<Vec<ModelInfo>> {
            Ok(Vec::new())
        }
    }

    /// Counts invocations; errors when `user_id` is "broken"
    #[derive(Default)]
    struct LookupTool {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Tool for Arc<LookupTool> {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "lookup".into(),
                description: "Look up a user".into(),
                parameters: vec![ParameterSchema::required("user_id", "string", "User id")],
                category: None,
            }
        }

        async fn execute(&self, args: &Map<String, Value>) -> Result<ToolResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match args.get("user_id").and_then(Value::as_str) {
                Some("broken") => Err(AgentError::ToolExecution("query timed out".into())),
                Some(id) => Ok(ToolResult::json("lookup", json!({"user_id": id, "level": 12}))),
                None => Ok(ToolResult::failure("lookup", "no user")),
            }
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        tokens: Mutex<String>,
        observations: Mutex<Vec<String>>,
    }

    impl StepObserver for RecordingObserver {
        fn on_token(&self, token: &str) {
            self.tokens.lock().unwrap().push_str(token);
        }

        fn on_observation(&self, _step: usize, observation: &str) {
            self.observations.lock().unwrap().push(observation.to_string());
        }
    }

    const FINISH_ACTION: &str = r#"{"name": "FINISH", "args": {}}"#;
    const LOOKUP_ACTION: &str = r#"{"name": "lookup", "args": {"user_id": "u1"}}"#;

    fn agent(
        provider: Arc<ScriptedProvider>,
        max_steps: usize,
        observer: Arc<RecordingObserver>,
        tool: Arc<LookupTool>,
    ) -> Agent {
        AgentBuilder::new()
            .provider(provider)
            .tool(tool)
            .max_steps(max_steps)
            .observer(observer)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_unknown_tool_exhausts_budget() {
        let provider = ScriptedProvider::new(&[], r#"{"name": "ghost", "args": {}}"#);
        let observer = Arc::new(RecordingObserver::default());
        let tool = Arc::new(LookupTool::default());
        let agent = agent(provider.clone(), 3, observer.clone(), tool.clone());

        let result = agent.run("analyze u1").await.unwrap();

        assert_eq!(result, RunResult::Exhausted { error: EXHAUSTED_MESSAGE.into() });
        assert_eq!(provider.stream_calls(), 3);
        assert_eq!(provider.complete_calls(), 0);
        assert_eq!(tool.calls.load(Ordering::SeqCst), 0);
        let observations = observer.observations.lock().unwrap();
        assert_eq!(observations.len(), 3);
        assert!(observations.iter().all(|o| o == TOOL_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_budget_counts_exact_cycles() {
        for budget in 1..=4 {
            let provider = ScriptedProvider::new(&[], LOOKUP_ACTION);
            let tool = Arc::new(LookupTool::default());
            let agent = agent(provider.clone(), budget, Arc::default(), tool.clone());

            let result = agent.run("analyze u1").await.unwrap();

            assert!(!result.is_finished());
            assert_eq!(provider.stream_calls(), budget);
            assert_eq!(tool.calls.load(Ordering::SeqCst), budget);
            assert_eq!(provider.complete_calls(), 0);
        }
    }

    #[tokio::test]
    async fn test_finish_on_first_step() {
        let provider = ScriptedProvider::new(&[FINISH_ACTION], LOOKUP_ACTION);
        let tool = Arc::new(LookupTool::default());
        let agent = agent(provider.clone(), 5, Arc::default(), tool.clone());

        let result = agent.run("analyze u1").await.unwrap();

        assert_eq!(result, RunResult::Finished { result: "final retention plan".into() });
        assert_eq!(tool.calls.load(Ordering::SeqCst), 0);
        assert_eq!(provider.stream_calls(), 1);
        assert_eq!(provider.complete_calls(), 1);
    }

    #[tokio::test]
    async fn test_finish_after_tool_calls_feeds_transcript_to_synthesis() {
        let provider = ScriptedProvider::new(&[LOOKUP_ACTION, LOOKUP_ACTION, FINISH_ACTION], "");
        let tool = Arc::new(LookupTool::default());
        let agent = agent(provider.clone(), 5, Arc::default(), tool.clone());

        let result = agent.run("analyze u1").await.unwrap();

        assert!(result.is_finished());
        assert_eq!(tool.calls.load(Ordering::SeqCst), 2);
        assert_eq!(provider.stream_calls(), 3);
        assert_eq!(provider.complete_calls(), 1);

        let prompts = provider.prompts.lock().unwrap();
        let final_prompt = prompts.last().unwrap();
        assert!(final_prompt.contains("analyze u1"));
        assert_eq!(final_prompt.matches(OBSERVATION_MARKER).count(), 2);
        assert!(final_prompt.contains(r#""level":12"#));
    }

    #[tokio::test]
    async fn test_step_prompt_contains_catalogue_and_seed_turn() {
        let provider = ScriptedProvider::new(&[FINISH_ACTION], "");
        let agent = agent(provider.clone(), 2, Arc::default(), Arc::default());

        agent.run("analyze u1").await.unwrap();

        let prompts = provider.prompts.lock().unwrap();
        let first = &prompts[0];
        assert!(first.contains("lookup: Look up a user"));
        assert!(first.contains("Human: \ninit\nAI: \nstart"));
        assert!(first.contains("Here is the output schema:"));
        assert!(!first.contains("{memory}"));
    }

    #[tokio::test]
    async fn test_tool_error_becomes_observation() {
        let provider = ScriptedProvider::new(
            &[r#"{"name": "lookup", "args": {"user_id": "broken"}}"#, FINISH_ACTION],
            "",
        );
        let observer = Arc::new(RecordingObserver::default());
        let agent = agent(provider.clone(), 5, observer.clone(), Arc::default());

        let result = agent.run("analyze broken").await.unwrap();

        assert!(result.is_finished());
        let observations = observer.observations.lock().unwrap();
        assert_eq!(observations.len(), 1);
        assert!(observations[0].contains("ToolExecution"));
        assert!(observations[0].contains(r#"{"user_id":"broken"}"#));
        assert_eq!(provider.stream_calls(), 2);
    }

    #[tokio::test]
    async fn test_parse_failure_aborts_run() {
        let provider = ScriptedProvider::new(&["the user looks fine to me"], FINISH_ACTION);
        let agent = agent(provider.clone(), 5, Arc::default(), Arc::default());

        let err = agent.run("analyze u1").await.unwrap_err();

        assert!(matches!(err, AgentError::Parse(_)));
        assert_eq!(provider.stream_calls(), 1);
        assert_eq!(provider.complete_calls(), 0);
    }

    #[tokio::test]
    async fn test_stream_error_aborts_run() {
        let provider = ScriptedProvider::failing();
        let agent = agent(provider.clone(), 5, Arc::default(), Arc::default());

        let err = agent.run("analyze u1").await.unwrap_err();
        assert!(matches!(err, AgentError::Provider(_)));
    }

    #[tokio::test]
    async fn test_observer_sees_every_token() {
        let provider = ScriptedProvider::new(&[LOOKUP_ACTION, FINISH_ACTION], "");
        let observer = Arc::new(RecordingObserver::default());
        let agent = agent(provider, 5, observer.clone(), Arc::default());

        agent.run("analyze u1").await.unwrap();

        assert_eq!(*observer.tokens.lock().unwrap(), format!("{LOOKUP_ACTION}{FINISH_ACTION}"));
    }

    #[tokio::test]
    async fn test_runs_do_not_share_memory() {
        let provider = ScriptedProvider::new(&[LOOKUP_ACTION, FINISH_ACTION, FINISH_ACTION], "");
        let agent = agent(provider.clone(), 5, Arc::default(), Arc::default());

        agent.run("first").await.unwrap();
        agent.run("second").await.unwrap();

        let prompts = provider.prompts.lock().unwrap();
        // [step, step, final] for the first run, [step, final] for the second
        assert_eq!(prompts.len(), 5);
        assert!(!prompts[3].contains(OBSERVATION_MARKER));
    }

    #[test]
    fn test_builder_rejects_duplicate_tools() {
        let result = AgentBuilder::new()
            .provider(ScriptedProvider::new(&[], ""))
            .tool(Arc::new(LookupTool::default()))
            .tool(Arc::new(LookupTool::default()))
            .build();
        assert!(matches!(result, Err(AgentError::DuplicateTool(_))));
    }

    #[test]
    fn test_builder_requires_provider_and_budget() {
        assert!(matches!(AgentBuilder::new().build(), Err(AgentError::Config(_))));

        let result = AgentBuilder::new()
            .provider(ScriptedProvider::new(&[], ""))
            .max_steps(0)
            .build();
        assert!(matches!(result, Err(AgentError::Config(_))));
    }

    #[test]
    fn test_run_result_wire_shape() {
        let ok = serde_json::to_value(RunResult::Finished { result: "plan".into() }).unwrap();
        assert_eq!(ok, json!({"result": "plan"}));
        let err = serde_json::to_value(RunResult::Exhausted { error: "out".into() }).unwrap();
        assert_eq!(err, json!({"error": "out"}));
    }
}
