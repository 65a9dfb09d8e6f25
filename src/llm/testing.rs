//! Test doubles for the oracle boundary.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde_json::Value;
use tokio::sync::Barrier;

use crate::error::OracleError;
use crate::llm::{ModelBackend, Oracle, StructuredSchema};

type BackendFn = dyn Fn(&str, &StructuredSchema) -> Result<Value, OracleError> + Send + Sync;
type ClassifyFn = dyn Fn(&str, &[&str]) -> Result<String, OracleError> + Send + Sync;
type ExtractFn = dyn Fn(&str) -> Result<Value, OracleError> + Send + Sync;

/// Backend answering from a closure and recording the model of every call
pub struct ScriptedBackend {
    respond: Box<BackendFn>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new<F>(respond: F) -> Self
    where
        F: Fn(&str, &StructuredSchema) -> Result<Value, OracleError> + Send + Sync + 'static,
    {
        Self {
            respond: Box::new(respond),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ModelBackend for ScriptedBackend {
    async fn complete(
        &self,
        model: &str,
        _prompt: &str,
        schema: &StructuredSchema,
    ) -> Result<Value, OracleError> {
        self.calls.lock().unwrap().push(model.to_string());
        (self.respond)(model, schema)
    }
}

/// Oracle answering from closures and counting calls
pub struct StubOracle {
    classify: Box<ClassifyFn>,
    extract: Box<ExtractFn>,
    classify_calls: AtomicUsize,
    extract_calls: AtomicUsize,
}

impl StubOracle {
    pub fn new<C, E>(classify: C, extract: E) -> Self
    where
        C: Fn(&str, &[&str]) -> Result<String, OracleError> + Send + Sync + 'static,
        E: Fn(&str) -> Result<Value, OracleError> + Send + Sync + 'static,
    {
        Self {
            classify: Box::new(classify),
            extract: Box::new(extract),
            classify_calls: AtomicUsize::new(0),
            extract_calls: AtomicUsize::new(0),
        }
    }

    /// Always gives the same label and the same quote
    pub fn constant(label: &str, quote: &str) -> Self {
        let label = label.to_string();
        let quote = quote.to_string();
        Self::new(
            move |_, _| Ok(label.clone()),
            move |_| Ok(serde_json::json!({ "quote": quote })),
        )
    }

    /// Hands out `answers` one per classify call, in order
    pub fn sequence(answers: &[&str]) -> Self {
        let queue: Mutex<VecDeque<String>> =
            Mutex::new(answers.iter().map(|a| a.to_string()).collect());
        Self::new(
            move |_, _| {
                queue
                    .lock()
                    .unwrap()
                    .pop_front()
                    .ok_or_else(|| OracleError::InvalidResponse("script exhausted".to_string()))
            },
            |_| Ok(serde_json::json!({ "quote": "scripted quote" })),
        )
    }

    pub fn classify_calls(&self) -> usize {
        self.classify_calls.load(Ordering::SeqCst)
    }

    pub fn extract_calls(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
    }
}

impl Oracle for StubOracle {
    async fn classify(&self, prompt: &str, labels: &[&str]) -> Result<String, OracleError> {
        self.classify_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        (self.classify)(prompt, labels)
    }

    async fn extract(
        &self,
        prompt: &str,
        _schema: &StructuredSchema,
    ) -> Result<Value, OracleError> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        (self.extract)(prompt)
    }
}

/// Oracle whose classify calls only return once `parties` of them are waiting
///
/// Sequential callers never get past the first call.
pub struct BarrierOracle {
    barrier: Barrier,
    label: String,
}

impl BarrierOracle {
    pub fn new(parties: usize, label: &str) -> Self {
        Self {
            barrier: Barrier::new(parties),
            label: label.to_string(),
        }
    }
}

impl Oracle for BarrierOracle {
    async fn classify(&self, _prompt: &str, _labels: &[&str]) -> Result<String, OracleError> {
        self.barrier.wait().await;
        Ok(self.label.clone())
    }

    async fn extract(
        &self,
        _prompt: &str,
        _schema: &StructuredSchema,
    ) -> Result<Value, OracleError> {
        Ok(serde_json::json!({ "quote": "scripted quote" }))
    }
}
