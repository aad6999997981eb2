//! Response construction: judge, optional expert fan-out, then synthesis
//!
//! One run per incoming message:
//!
//! ```text
//! Judging ──simple──▶ General Agent ──────────────────────────────▶ Done
//!    └────complex──▶ five experts (concurrent) ─▶ Summarizer ─────▶ Done
//! ```
//!
//! Every trace turn is handed to the caller's [`TurnSink`] as it is emitted,
//! so intermediate turns can be delivered before the final answer exists.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::agent::Agent;
use crate::agents::AgentRegistry;
use crate::error::{PanelError, Result};
use crate::judge::Route;
use crate::types::{CONSTRUCTOR_WINDOW, Message, ThreadMessage, Trace, recent};

pub const JUDGE: &str = "Judge";
pub const GENERAL_AGENT: &str = "General Agent";
pub const SUMMARIZER: &str = "Summarizer";

/// Fan-out agents, in the order their turns are emitted
pub const EXPERTS: [&str; 5] = [
    "Research Scientist",
    "Psychologist",
    "Career Advisor",
    "Friend",
    "Information Retriever",
];

/// Every name the panel must define
pub const REQUIRED_AGENTS: [&str; 8] = [
    JUDGE,
    GENERAL_AGENT,
    SUMMARIZER,
    EXPERTS[0],
    EXPERTS[1],
    EXPERTS[2],
    EXPERTS[3],
    EXPERTS[4],
];

/// Receives each trace turn as it is emitted.
///
/// Returns the stored form of the turn and its timestamp. An error aborts the
/// run; turns delivered before it stay delivered.
pub trait TurnSink: Send {
    fn on_turn(&mut self, role: &str, content: &str) -> anyhow::Result<(ThreadMessage, DateTime<Utc>)>;
}

impl<F> TurnSink for F
where
    F: FnMut(&str, &str) -> anyhow::Result<(ThreadMessage, DateTime<Utc>)> + Send,
{
    fn on_turn(&mut self, role: &str, content: &str) -> anyhow::Result<(ThreadMessage, DateTime<Utc>)> {
        self(role, content)
    }
}

/// Sink that only stamps turns with the current time
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordingSink;

impl TurnSink for RecordingSink {
    fn on_turn(&mut self, role: &str, content: &str) -> anyhow::Result<(ThreadMessage, DateTime<Utc>)> {
        Ok((ThreadMessage::new(role, content), Utc::now()))
    }
}

/// Configuration for the response constructor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructorConfig {
    /// Run the five expert calls concurrently
    #[serde(default = "default_parallel_fan_out")]
    pub parallel_fan_out: bool,
}

fn default_parallel_fan_out() -> bool {
    true
}

impl Default for ConstructorConfig {
    fn default() -> Self {
        Self {
            parallel_fan_out: default_parallel_fan_out(),
        }
    }
}

/// Outcome of one run
#[derive(Debug, Clone)]
pub struct Response {
    pub answer: String,
    pub route: Route,
    pub trace: Trace,
}

/// Runs the judge → simple | fan-out → summarize protocol
pub struct ResponseConstructor {
    judge: Arc<Agent>,
    general: Arc<Agent>,
    summarizer: Arc<Agent>,
    experts: Vec<Arc<Agent>>,
    config: ConstructorConfig,
}

impl std::fmt::Debug for ResponseConstructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseConstructor")
            .field("judge", &self.judge.trace_label())
            .field("general", &self.general.trace_label())
            .field("summarizer", &self.summarizer.trace_label())
            .field("experts", &self.experts.len())
            .field("config", &self.config)
            .finish()
    }
}

impl ResponseConstructor {
    /// Resolve the fixed panel up front; fails before any provider call if
    /// a required agent is missing.
    pub fn new(registry: &AgentRegistry, config: ConstructorConfig) -> Result<Self> {
        registry.require(&REQUIRED_AGENTS)?;

        let experts = EXPERTS
            .iter()
            .map(|name| registry.resolve(name))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            judge: registry.resolve(JUDGE)?,
            general: registry.resolve(GENERAL_AGENT)?,
            summarizer: registry.resolve(SUMMARIZER)?,
            experts,
            config,
        })
    }

    /// Produce the final answer for `history`, emitting trace turns to `sink`
    pub async fn respond(&self, history: &[Message], sink: &mut dyn TurnSink) -> Result<Response> {
        let history = recent(history, CONSTRUCTOR_WINDOW);
        let mut trace = Trace::new();

        let verdict = self.judge.answer(history).await?;
        Self::emit(sink, &mut trace, JUDGE, &verdict)?;

        let route = Route::from_judge_output(&verdict);
        info!("Judge routed request as {} ({} messages)", route, history.len());

        let answer = match route {
            Route::Simple => self.general.answer(history).await?,
            Route::Complex => {
                let responses = if self.config.parallel_fan_out {
                    self.consult_concurrently(history).await?
                } else {
                    self.consult_sequentially(history).await?
                };

                for (agent, response) in self.experts.iter().zip(&responses) {
                    Self::emit(sink, &mut trace, &agent.trace_label(), response)?;
                }

                let mut extended = history.to_vec();
                extended.push(Message::system(self.expert_briefing(&responses)));
                self.summarizer.answer(&extended).await?
            }
        };

        debug!("Run complete: route={}, trace={} turns", route, trace.len());
        Ok(Response {
            answer,
            route,
            trace,
        })
    }

    fn emit(sink: &mut dyn TurnSink, trace: &mut Trace, role: &str, content: &str) -> Result<()> {
        let (message, timestamp) = sink.on_turn(role, content).map_err(PanelError::Delivery)?;
        trace.push(message, timestamp);
        Ok(())
    }

    /// All experts at once; results come back in panel order regardless of
    /// completion order. The first failure aborts the rest.
    async fn consult_concurrently(&self, history: &[Message]) -> Result<Vec<String>> {
        let shared: Arc<[Message]> = Arc::from(history);
        let mut join_set = JoinSet::new();

        for (idx, agent) in self.experts.iter().enumerate() {
            let agent = Arc::clone(agent);
            let history = Arc::clone(&shared);
            join_set.spawn(async move { (idx, agent.answer(&history).await) });
        }

        let mut slots: Vec<Option<String>> = vec![None; self.experts.len()];
        while let Some(joined) = join_set.join_next().await {
            let (idx, result) = joined?;
            match result {
                Ok(text) => {
                    debug!("Expert '{}' finished", self.experts[idx].name());
                    slots[idx] = Some(text);
                }
                Err(e) => {
                    warn!(
                        "Expert '{}' failed, aborting fan-out: {}",
                        self.experts[idx].name(),
                        e
                    );
                    join_set.abort_all();
                    return Err(e);
                }
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }

    async fn consult_sequentially(&self, history: &[Message]) -> Result<Vec<String>> {
        let mut responses = Vec::with_capacity(self.experts.len());
        for agent in &self.experts {
            responses.push(agent.answer(history).await?);
        }
        Ok(responses)
    }

    /// System message carrying every expert answer to the summarizer
    fn expert_briefing(&self, responses: &[String]) -> String {
        let block = self
            .experts
            .iter()
            .zip(responses)
            .map(|(agent, response)| {
                format!("<{name}>\n{response}\n</{name}>\n\n", name = agent.name())
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "These are responses of several different experts:\n{}\n\n\
             Use them for insight only. The person you are talking to cannot see \
             these responses or the expert names, so answer the original question \
             in your own words as a standalone reply.",
            block
        )
    }
}
