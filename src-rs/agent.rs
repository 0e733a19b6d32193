use std::sync::Arc;

use chrono::NaiveDate;
use futures_util::future::join_all;
use tracing::{debug, error, info, warn};

use crate::claim::Claim;
use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::llm::{CompletionRequest, LLMRouter, Message, ModelContent, ToolCall};
use crate::prompt::{build_prompt, SYSTEM_PROMPT};
use crate::result::AgentResult;
use crate::tools::{ToolDescriptor, ToolRegistry, ToolResult, ToolSchema};

enum LoopState {
    AwaitingModel,
    AwaitingTool(Vec<ToolCall>),
    Done(ModelContent),
    Failed(AgentError),
}

/// Tool-augmented reasoning loop. Holds no per-request state, so one
/// instance serves any number of concurrent claims.
pub struct Agent {
    pub name: String,
    pub config: AgentConfig,
    pub system_prompt: String,
    pub router: Arc<LLMRouter>,
    pub tools: Arc<ToolRegistry>,
}

impl Agent {
    pub fn new(
        name: &str,
        mut config: AgentConfig,
        system_prompt: &str,
        router: Arc<LLMRouter>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        let resolved_name = if name.is_empty() { "fact-checker" } else { name };
        let prompt = if system_prompt.is_empty() {
            SYSTEM_PROMPT
        } else {
            system_prompt
        };
        if config.max_turns == 0 {
            config.max_turns = AgentConfig::default().max_turns;
        }
        Self {
            name: resolved_name.to_string(),
            config,
            system_prompt: prompt.to_string(),
            router,
            tools,
        }
    }

    /// Builds the task prompt for `claim` and runs the loop on it.
    pub async fn check(&self, claim: &Claim, today: NaiveDate) -> AgentResult {
        let prompt = build_prompt(claim.text(), today, claim.image());
        self.execute(&prompt).await
    }

    pub async fn execute(&self, instruction: &str) -> AgentResult {
        let mut history = vec![Message::system(&self.system_prompt), Message::user(instruction)];
        let schemas = if self.tools.count() > 0 {
            Some(self.tools.get_schemas())
        } else {
            None
        };

        let mut turns = 0;
        let mut state = LoopState::AwaitingModel;
        loop {
            state = match state {
                LoopState::AwaitingModel => {
                    if turns >= self.config.max_turns {
                        LoopState::Failed(AgentError::LoopBudgetExceeded(turns))
                    } else {
                        turns += 1;
                        self.query_model(&history, schemas.clone(), turns).await
                    }
                }
                // No query is left to read the results, so the calls are skipped.
                LoopState::AwaitingTool(_) if turns >= self.config.max_turns => {
                    LoopState::Failed(AgentError::LoopBudgetExceeded(turns))
                }
                LoopState::AwaitingTool(calls) => self.run_tools(calls, &mut history).await,
                LoopState::Done(content) => {
                    info!(agent = %self.name, turns, "final answer");
                    return AgentResult::done(content, turns, history);
                }
                LoopState::Failed(err) => {
                    error!(agent = %self.name, turns, kind = err.kind(), "loop failed: {}", err);
                    return AgentResult::failed(err, turns, history);
                }
            };
        }
    }

    async fn query_model(&self, history: &[Message], tools: Option<Vec<ToolSchema>>, turn: usize) -> LoopState {
        let request = CompletionRequest {
            messages: history.to_vec(),
            tools,
            temperature: Some(self.config.temperature),
            model: Some(self.config.model.clone()),
            max_tokens: Some(self.config.max_tokens),
        };
        debug!(agent = %self.name, turn, messages = history.len(), "querying model");
        match self.router.complete(request).await {
            Ok(resp) if resp.tool_calls.is_empty() => LoopState::Done(resp.content),
            Ok(resp) => {
                let names: Vec<&str> = resp.tool_calls.iter().map(|c| c.name.as_str()).collect();
                info!(agent = %self.name, turn, tools = ?names, "model requested tools");
                LoopState::AwaitingTool(resp.tool_calls)
            }
            Err(err) => LoopState::Failed(AgentError::Model(err)),
        }
    }

    /// Runs every call of one turn concurrently and appends the results in
    /// request order. Nothing runs if any name is unknown.
    async fn run_tools(&self, calls: Vec<ToolCall>, history: &mut Vec<Message>) -> LoopState {
        let mut resolved: Vec<&ToolDescriptor> = Vec::with_capacity(calls.len());
        for call in &calls {
            match self.tools.resolve(&call.name) {
                Ok(descriptor) => resolved.push(descriptor),
                Err(_) => return LoopState::Failed(AgentError::UnknownTool(call.name.clone())),
            }
        }

        history.push(Message::assistant_tool_calls(calls.clone()));

        let outcomes = join_all(
            calls
                .iter()
                .zip(resolved)
                .map(|(call, descriptor)| self.tools.run(descriptor, call.args.clone())),
        )
        .await;

        for (call, outcome) in calls.iter().zip(outcomes) {
            let result = ToolResult::from_outcome(call, outcome);
            if !result.success {
                warn!(agent = %self.name, tool = %result.name, "tool failure folded into history");
            }
            history.push(Message::tool_result(call, result.output));
        }
        LoopState::AwaitingModel
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LLMResponse, ProviderAdapter, ProviderError, Role};
    use crate::result::AgentOutcome;
    use crate::tools::{handler_fn, ParamType, ToolError, ToolKind, ToolParam, TOOL_FAILURE_MARKER};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    struct ScriptedProvider {
        script: Mutex<VecDeque<Result<LLMResponse, ProviderError>>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedProvider {
        fn new(script: Vec<Result<LLMResponse, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn queries(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ProviderAdapter for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn complete(&self, request: CompletionRequest) -> Result<LLMResponse, ProviderError> {
            self.requests.lock().unwrap().push(request);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(answer("**Unverifiable:** script exhausted.")))
        }
    }

    fn answer(text: &str) -> LLMResponse {
        LLMResponse {
            content: ModelContent::Text(text.to_string()),
            ..LLMResponse::default()
        }
    }

    fn calls(names: &[&str]) -> LLMResponse {
        LLMResponse {
            content: ModelContent::Text("let me look that up".to_string()),
            tool_calls: names
                .iter()
                .enumerate()
                .map(|(i, name)| ToolCall {
                    id: format!("call_{}", i),
                    name: name.to_string(),
                    args: json!({"query": "great wall moon"}),
                })
                .collect(),
            raw: None,
        }
    }

    fn registry(fail_fact_check: bool) -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        let query = || vec![ToolParam::required("query", ParamType::String, "query")];
        registry
            .register(ToolDescriptor::new(
                ToolKind::Search,
                "search",
                query(),
                handler_fn(|args| async move {
                    // Slower than check_fact so completion order differs from request order.
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok(format!("search hit for {}", args.get("query").and_then(|v| v.as_str()).unwrap_or("")))
                }),
            ))
            .unwrap();
        registry
            .register(ToolDescriptor::new(
                ToolKind::CheckFact,
                "fact check",
                query(),
                handler_fn(move |_| async move {
                    if fail_fact_check {
                        Err(ToolError::Status {
                            service: "Google Fact Check API",
                            status: 503,
                        })
                    } else {
                        Ok("Claim: wall\nRating: False\n".to_string())
                    }
                }),
            ))
            .unwrap();
        Arc::new(registry)
    }

    fn agent(provider: Arc<ScriptedProvider>, tools: Arc<ToolRegistry>, max_turns: usize) -> Agent {
        let router = Arc::new(LLMRouter::new(provider).with_retries(0));
        let config = AgentConfig {
            max_turns,
            ..AgentConfig::default()
        };
        Agent::new("test", config, "", router, tools)
    }

    #[tokio::test]
    async fn direct_answer_takes_one_turn() {
        let provider = ScriptedProvider::new(vec![Ok(answer("**True:** yes."))]);
        let result = agent(provider.clone(), registry(false), 5).execute("claim").await;
        assert!(result.success());
        assert_eq!(result.turns, 1);
        assert_eq!(provider.queries(), 1);
        assert_eq!(result.history.len(), 2);
        assert_eq!(result.history[0].role, Role::System);
        assert_eq!(result.history[0].content, SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn tool_results_appended_in_request_order() {
        let provider = ScriptedProvider::new(vec![
            Ok(calls(&["search", "check_fact"])),
            Ok(answer("**False:** it is not visible. [Snopes](https://snopes.com)")),
        ]);
        let result = agent(provider.clone(), registry(false), 5).execute("claim").await;
        assert!(result.success());
        assert_eq!(result.turns, 2);

        let history = &result.history;
        assert_eq!(history[2].role, Role::Assistant);
        assert!(history[2].content.is_empty());
        assert_eq!(history[2].tool_calls.len(), 2);
        assert_eq!(history[3].tool_call_id.as_deref(), Some("call_0"));
        assert!(history[3].content.starts_with("search hit"));
        assert_eq!(history[4].tool_call_id.as_deref(), Some("call_1"));

        // The second query saw both results.
        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[1].messages.len(), 5);
        assert!(requests[1].tools.as_ref().map(|t| t.len()) == Some(2));
    }

    #[tokio::test]
    async fn unknown_tool_fails_without_requerying() {
        let provider = ScriptedProvider::new(vec![Ok(calls(&["check_fact", "weather"]))]);
        let result = agent(provider.clone(), registry(false), 5).execute("claim").await;
        assert!(matches!(result.error(), Some(AgentError::UnknownTool(name)) if name == "weather"));
        assert_eq!(provider.queries(), 1);
        assert_eq!(result.tool_results(), 0);
    }

    #[tokio::test]
    async fn registered_name_but_unregistered_kind_is_unknown() {
        let provider = ScriptedProvider::new(vec![Ok(calls(&["describe_image"]))]);
        let result = agent(provider, registry(false), 5).execute("claim").await;
        assert!(matches!(result.error(), Some(AgentError::UnknownTool(_))));
    }

    #[tokio::test]
    async fn tool_failure_keeps_loop_going() {
        let provider = ScriptedProvider::new(vec![
            Ok(calls(&["check_fact"])),
            Ok(answer("**Unverifiable:** no fact checks available. (Source: none)")),
        ]);
        let result = agent(provider.clone(), registry(true), 5).execute("claim").await;
        assert!(result.success());
        assert_eq!(provider.queries(), 2);
        let tool_msg = &result.history[3];
        assert!(tool_msg.content.starts_with(TOOL_FAILURE_MARKER));
        assert!(tool_msg.content.contains("Status code: 503"));
    }

    #[tokio::test]
    async fn budget_exceeded_after_cap() {
        let provider = ScriptedProvider::new((0..10).map(|_| Ok(calls(&["search"]))).collect());
        let result = agent(provider.clone(), registry(false), 3).execute("claim").await;
        assert!(matches!(result.error(), Some(AgentError::LoopBudgetExceeded(3))));
        assert_eq!(provider.queries(), 3);
        assert_eq!(result.tool_results(), 2);
    }

    #[tokio::test]
    async fn tools_requested_on_last_turn_never_run() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        let mut registry = ToolRegistry::new();
        registry
            .register(ToolDescriptor::new(
                ToolKind::Search,
                "search",
                vec![ToolParam::required("query", ParamType::String, "query")],
                handler_fn(move |_| {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok("hit".to_string())
                    }
                }),
            ))
            .unwrap();

        let provider = ScriptedProvider::new((0..3).map(|_| Ok(calls(&["search"]))).collect());
        let result = agent(provider.clone(), Arc::new(registry), 1).execute("claim").await;
        assert!(matches!(result.error(), Some(AgentError::LoopBudgetExceeded(1))));
        assert_eq!(provider.queries(), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(result.tool_results(), 0);
    }

    fn sleeping_registry(delay: Duration, finished: Arc<AtomicUsize>) -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        for kind in [ToolKind::Search, ToolKind::CheckNews] {
            let finished = finished.clone();
            registry
                .register(ToolDescriptor::new(
                    kind,
                    "slow lookup",
                    vec![ToolParam::required("query", ParamType::String, "query")],
                    handler_fn(move |_| {
                        let finished = finished.clone();
                        async move {
                            tokio::time::sleep(delay).await;
                            finished.fetch_add(1, Ordering::SeqCst);
                            Ok("slow hit".to_string())
                        }
                    }),
                ))
                .unwrap();
        }
        Arc::new(registry)
    }

    #[tokio::test]
    async fn calls_in_one_turn_overlap() {
        let finished = Arc::new(AtomicUsize::new(0));
        let provider = ScriptedProvider::new(vec![
            Ok(calls(&["search", "check_news"])),
            Ok(answer("**True:** both agree.")),
        ]);
        let tools = sleeping_registry(Duration::from_millis(300), finished.clone());

        let started = Instant::now();
        let result = agent(provider, tools, 5).execute("claim").await;
        let elapsed = started.elapsed();

        assert!(result.success());
        assert_eq!(finished.load(Ordering::SeqCst), 2);
        assert!(elapsed < Duration::from_millis(550), "turn took {:?}", elapsed);
    }

    #[tokio::test]
    async fn dropping_the_loop_abandons_running_tools() {
        let finished = Arc::new(AtomicUsize::new(0));
        let provider = ScriptedProvider::new(vec![
            Ok(calls(&["search", "check_news"])),
            Ok(answer("**True:** too late.")),
        ]);
        let agent = agent(provider.clone(), sleeping_registry(Duration::from_millis(300), finished.clone()), 5);

        let outcome = tokio::time::timeout(Duration::from_millis(50), agent.execute("claim")).await;
        assert!(outcome.is_err());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(finished.load(Ordering::SeqCst), 0);
        assert_eq!(provider.queries(), 1);
    }

    #[tokio::test]
    async fn answer_on_last_allowed_turn_succeeds() {
        let provider = ScriptedProvider::new(vec![
            Ok(calls(&["search"])),
            Ok(answer("**True:** done.")),
        ]);
        let result = agent(provider, registry(false), 2).execute("claim").await;
        assert!(result.success());
        assert_eq!(result.turns, 2);
    }

    #[tokio::test]
    async fn model_error_fails_loop() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::new("parse_error", "garbage", false))]);
        let result = agent(provider, registry(false), 5).execute("claim").await;
        match result.outcome {
            AgentOutcome::Failed(AgentError::Model(err)) => assert_eq!(err.code, "parse_error"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn check_builds_prompt_from_claim() {
        let provider = ScriptedProvider::new(vec![Ok(answer("**True:** ok."))]);
        let claim = Claim::from_request(Some("Water boils at 100C".into()), Some("https://img.test/k.png".into())).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        agent(provider.clone(), registry(false), 5).check(&claim, today).await;
        let requests = provider.requests.lock().unwrap();
        let task = &requests[0].messages[1].content;
        assert!(task.starts_with("Considering the image here: https://img.test/k.png. "));
        assert!(task.contains("\"Water boils at 100C\""));
    }
}
