//! Mock resolvers and handlers for exercising the runtime without a registry.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tally_slow_checks::checks::{
    CheckContext, HandlerOutput, ResolveError, ResolveInput, ResolvedValue, Resolver,
    ResultHandler,
};
use tally_slow_checks::image::{ImageConfig, ImageError, ImageResolver};

/// Behavior of a [`CountingResolver`] call
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Return the input echoed back as JSON
    Echo,
    /// Sleep (honoring the context), then echo
    Delay(Duration),
    /// Wait until the context is done and return its error
    Hang,
    /// Fail with a generic error
    Fail(String),
}

/// Resolver that counts invocations, per key and in flight
pub struct CountingResolver {
    id: String,
    behavior: MockBehavior,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    per_input: Mutex<HashMap<String, usize>>,
}

impl CountingResolver {
    pub fn new(id: impl Into<String>, behavior: MockBehavior) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            behavior,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            per_input: Mutex::new(HashMap::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls_for(&self, input: &ResolveInput) -> usize {
        self.per_input
            .lock()
            .get(&input_key(input))
            .copied()
            .unwrap_or(0)
    }
}

fn input_key(input: &ResolveInput) -> String {
    serde_json::to_string(input).unwrap_or_default()
}

#[async_trait]
impl Resolver for CountingResolver {
    fn id(&self) -> &str {
        &self.id
    }

    async fn resolve(
        &self,
        ctx: &CheckContext,
        input: &ResolveInput,
    ) -> Result<ResolvedValue, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.per_input.lock().entry(input_key(input)).or_insert(0) += 1;
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let outcome = match &self.behavior {
            MockBehavior::Echo => Ok(echo(input)),
            MockBehavior::Delay(delay) => ctx.sleep(*delay).await.map(|_| echo(input)),
            MockBehavior::Hang => {
                ctx.done().await;
                Err(ctx.err().unwrap_or(ResolveError::DeadlineExceeded))
            }
            MockBehavior::Fail(message) => {
                Err(ResolveError::Other(anyhow::anyhow!(message.clone())))
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome
    }
}

fn echo(input: &ResolveInput) -> ResolvedValue {
    match input {
        ResolveInput::Json(value) => ResolvedValue::Json(value.clone()),
        other => ResolvedValue::Json(serde_json::to_value(other).unwrap_or_default()),
    }
}

/// Handler that records every value it sees and returns fixed outputs
pub struct RecordingHandler {
    seen: Mutex<Vec<ResolvedValue>>,
    outputs: Option<Vec<HandlerOutput>>,
}

impl RecordingHandler {
    /// Processes every value, reporting `outputs`
    pub fn reporting(outputs: Vec<HandlerOutput>) -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
            outputs: Some(outputs),
        })
    }

    /// Declines every value
    pub fn declining() -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
            outputs: None,
        })
    }

    pub fn seen(&self) -> Vec<ResolvedValue> {
        self.seen.lock().clone()
    }
}

impl ResultHandler for RecordingHandler {
    fn on_success(&self, resolved: &ResolvedValue) -> Option<Vec<HandlerOutput>> {
        self.seen.lock().push(resolved.clone());
        self.outputs.clone()
    }
}

/// Handler that always panics
pub struct PanickingHandler;

impl ResultHandler for PanickingHandler {
    fn on_success(&self, _resolved: &ResolvedValue) -> Option<Vec<HandlerOutput>> {
        panic!("handler blew up");
    }
}

pub type ImageStep = fn() -> Result<ImageConfig, ImageError>;

/// Image resolver replaying a script; the last step repeats once the script is exhausted
pub struct ScriptedImageResolver {
    script: Mutex<VecDeque<ImageStep>>,
    calls: AtomicUsize,
}

impl ScriptedImageResolver {
    pub fn new(script: Vec<ImageStep>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageResolver for ScriptedImageResolver {
    async fn resolve_config(
        &self,
        _ctx: &CheckContext,
        _reference: &str,
        _platform: &str,
    ) -> Result<ImageConfig, ImageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = {
            let mut script = self.script.lock();
            if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().copied()
            }
        };
        match step {
            Some(step) => step(),
            None => Err(ImageError::network("script exhausted")),
        }
    }
}
