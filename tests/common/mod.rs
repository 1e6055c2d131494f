//! Scripted collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use askweb::agent::{
    AgentConfig, ChatRequest, ChatResponse, LlmProvider, Orchestrator, PromptSet,
};
use askweb::core::{SearchQuery, SearchResult};
use askweb::error::{AgentError, FetchError};
use askweb::search::{PageFetcher, SearchEngine};
use async_trait::async_trait;

/// Workflow step a provider call belongs to, recognised by system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Classifier,
    Generator,
    Evaluator,
    Synthesizer,
    Text,
    Math,
    Selector,
}

type Reply = Result<String, AgentError>;

/// Provider answering from per-step scripts, then per-step defaults.
pub struct ScriptedProvider {
    prompts: PromptSet,
    scripts: Mutex<HashMap<Step, VecDeque<Reply>>>,
    defaults: HashMap<Step, Reply>,
    calls: Mutex<Vec<(Step, ChatRequest)>>,
}

impl ScriptedProvider {
    /// Search route, one sufficient round, answer "answer".
    pub fn new() -> Self {
        let defaults = HashMap::from([
            (Step::Classifier, Ok("search".to_string())),
            (Step::Generator, Ok(r#"["default query"]"#.to_string())),
            (
                Step::Evaluator,
                Ok(r#"{"sufficient": true, "reason": "covered"}"#.to_string()),
            ),
            (Step::Synthesizer, Ok("answer".to_string())),
            (Step::Text, Ok("text answer".to_string())),
            (Step::Math, Ok("42".to_string())),
            (Step::Selector, Ok("1".to_string())),
        ]);

        Self {
            prompts: PromptSet::defaults(),
            scripts: Mutex::new(HashMap::new()),
            defaults,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the reply used once a step's script runs out.
    pub fn default_reply(mut self, step: Step, reply: Reply) -> Self {
        self.defaults.insert(step, reply);
        self
    }

    /// Queues replies for a step, consumed in order.
    pub fn script(self, step: Step, replies: Vec<Reply>) -> Self {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.entry(step).or_default().extend(replies);
        }
        self
    }

    /// Number of calls made for a step.
    pub fn calls(&self, step: Step) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.iter().filter(|(s, _)| *s == step).count())
            .unwrap_or_default()
    }

    /// Total number of provider calls.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or_default()
    }

    /// Requests made for a step, in call order.
    pub fn requests(&self, step: Step) -> Vec<ChatRequest> {
        self.calls
            .lock()
            .map(|calls| {
                calls
                    .iter()
                    .filter(|(s, _)| *s == step)
                    .map(|(_, r)| r.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn step_for(&self, request: &ChatRequest) -> Option<Step> {
        let system = request.system_prompt()?;
        let p = &self.prompts;
        [
            (&p.classifier, Step::Classifier),
            (&p.generator, Step::Generator),
            (&p.evaluator, Step::Evaluator),
            (&p.strict_evaluator, Step::Evaluator),
            (&p.synthesizer, Step::Synthesizer),
            (&p.text, Step::Text),
            (&p.math, Step::Math),
            (&p.selector, Step::Selector),
        ]
        .into_iter()
        .find(|(prompt, _)| prompt.as_str() == system)
        .map(|(_, step)| step)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        let Some(step) = self.step_for(request) else {
            return Err(AgentError::ApiRequest {
                message: "unknown system prompt".to_string(),
                status: Some(400),
            });
        };

        if let Ok(mut calls) = self.calls.lock() {
            calls.push((step, request.clone()));
        }

        let scripted = self
            .scripts
            .lock()
            .ok()
            .and_then(|mut scripts| scripts.get_mut(&step).and_then(VecDeque::pop_front));
        let reply = scripted
            .or_else(|| self.defaults.get(&step).cloned())
            .unwrap_or_else(|| Ok(String::new()));

        reply.map(ChatResponse::text)
    }
}

/// Engine with configurable result URLs.
pub struct FakeEngine {
    mode: EngineMode,
    queries: Mutex<Vec<String>>,
}

enum EngineMode {
    /// One result per query, URL derived from the query text.
    PerQuery,
    /// The same URLs for every query.
    Fixed(Vec<String>),
    /// No results at all.
    Empty,
}

impl FakeEngine {
    pub fn per_query() -> Self {
        Self::with_mode(EngineMode::PerQuery)
    }

    pub fn fixed(urls: &[&str]) -> Self {
        Self::with_mode(EngineMode::Fixed(
            urls.iter().map(ToString::to_string).collect(),
        ))
    }

    pub fn empty() -> Self {
        Self::with_mode(EngineMode::Empty)
    }

    fn with_mode(mode: EngineMode) -> Self {
        Self {
            mode,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Queries searched so far.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SearchEngine for FakeEngine {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn search(
        &self,
        query: &SearchQuery,
        limit: usize,
    ) -> Result<Vec<SearchResult>, FetchError> {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.to_string());
        }

        let urls = match &self.mode {
            EngineMode::PerQuery => vec![format!(
                "https://example.com/{}",
                query.as_str().replace(' ', "-")
            )],
            EngineMode::Fixed(urls) => urls.clone(),
            EngineMode::Empty => Vec::new(),
        };

        Ok(urls
            .into_iter()
            .take(limit)
            .map(|url| SearchResult {
                title: format!("Title of {url}"),
                snippet: String::new(),
                url,
            })
            .collect())
    }
}

/// Fetcher serving a canned page per URL, or failing every call.
pub struct FakeFetcher {
    pages: HashMap<String, String>,
    fail_all: bool,
    calls: Mutex<usize>,
}

impl FakeFetcher {
    /// Serves "Content of <url>." for every URL.
    pub fn ok() -> Self {
        Self {
            pages: HashMap::new(),
            fail_all: false,
            calls: Mutex::new(0),
        }
    }

    /// Fails every fetch with a network error.
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::ok()
        }
    }

    /// Serves `text` for `url`.
    pub fn page(mut self, url: &str, text: &str) -> Self {
        self.pages.insert(url.to_string(), text.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().map(|c| *c).unwrap_or_default()
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls += 1;
        }
        if self.fail_all {
            return Err(FetchError::Network {
                url: url.to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(self
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| format!("Content of {url}.")))
    }
}

/// Test configuration with the given default retry budget.
pub fn config(max_retries: u32) -> AgentConfig {
    AgentConfig::builder()
        .api_key("test-key")
        .max_retries(max_retries)
        .search_results_per_query(2)
        .query_generation_attempts(1)
        .build()
        .unwrap_or_else(|_| unreachable!())
}

/// Orchestrator over shared fakes, with compiled-in prompts.
pub fn orchestrator(
    provider: &Arc<ScriptedProvider>,
    engine: &Arc<FakeEngine>,
    fetcher: &Arc<FakeFetcher>,
    config: AgentConfig,
) -> Orchestrator {
    Orchestrator::with_prompts(
        Arc::clone(provider) as Arc<dyn LlmProvider>,
        Arc::clone(engine) as Arc<dyn SearchEngine>,
        Arc::clone(fetcher) as Arc<dyn PageFetcher>,
        config,
        &PromptSet::defaults(),
    )
}
