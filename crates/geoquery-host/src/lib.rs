//! Turn runtime: classifies each user turn, runs its extraction agent, and
//! keeps an audit trail.
//!
//! At most one agent invocation is live per [`Session`]. Submitting a new
//! turn cancels the previous one; a cancelled invocation never renders.

mod state;

pub use state::{FixedPosition, SharedSelection};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::info;

use geoquery_ai::{
    AgentReport, AgentRequest, Agents, CancelToken, Classification, FeatureSelection,
    PositionSource, classify,
};
use geoquery_core::{QueryIntent, QuerySubtype, SessionContext};

/// Host-side audit entry for one turn.
#[derive(Debug, Clone)]
pub struct TurnRecord {
    pub timestamp: DateTime<Utc>,
    pub user_text: String,
    pub intent: QueryIntent,
    pub subtype: Option<QuerySubtype>,
    pub rule: &'static str,
    pub success: bool,
    /// Rendered geometry kinds on success, the error otherwise.
    pub detail: String,
}

/// Result of submitting one turn.
#[derive(Debug)]
pub struct TurnOutcome {
    pub classification: Classification,
    pub report: AgentReport,
}

pub struct Session {
    agents: Agents,
    selection: Arc<dyn FeatureSelection>,
    position: Arc<dyn PositionSource>,
    active: Mutex<Option<CancelToken>>,
    records: Mutex<Vec<TurnRecord>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Session {
    pub fn new(
        agents: Agents,
        selection: Arc<dyn FeatureSelection>,
        position: Arc<dyn PositionSource>,
    ) -> Self {
        Self {
            agents,
            selection,
            position,
            active: Mutex::new(None),
            records: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of selection and position, read once per turn.
    pub fn context(&self) -> SessionContext {
        SessionContext {
            selection: self.selection.current(),
            user_position: self.position.user_position(),
            viewport_center: self.position.viewport_center(),
        }
    }

    /// Cancel the in-flight turn, if any. Returns whether one was running.
    pub fn cancel_active(&self) -> bool {
        match lock(&self.active).take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Classify and run one turn, cancelling whatever was still running.
    pub async fn submit(&self, user_text: &str, ai_text: &str) -> TurnOutcome {
        let cancel = CancelToken::new();
        if let Some(previous) = lock(&self.active).replace(cancel.clone()) {
            previous.cancel();
            info!("cancelled the previous turn");
        }

        let context = self.context();
        let classification = classify(user_text, ai_text);
        info!(
            intent = %classification.intent,
            subtype = %classification.subtype,
            rule = classification.rule,
            "classified query"
        );

        let request = AgentRequest::new(user_text, ai_text).with_subtype(classification.subtype);
        let report = self
            .agents
            .run(classification.intent, &request, &context, &cancel)
            .await;

        {
            let mut active = lock(&self.active);
            if active.as_ref().is_some_and(|t| t.same_as(&cancel)) {
                *active = None;
            }
        }
        self.record(user_text, &classification, &report);

        TurnOutcome {
            classification,
            report,
        }
    }

    fn record(&self, user_text: &str, classification: &Classification, report: &AgentReport) {
        let detail = match &report.error {
            Some(err) => err.to_string(),
            None => report
                .geometries
                .iter()
                .map(|g| g.kind())
                .collect::<Vec<_>>()
                .join(","),
        };
        let record = TurnRecord {
            timestamp: Utc::now(),
            user_text: user_text.to_string(),
            intent: report.intent,
            subtype: report.subtype,
            rule: classification.rule,
            success: report.success(),
            detail,
        };
        info!(
            intent = %record.intent,
            success = record.success,
            detail = %record.detail,
            "turn recorded"
        );
        lock(&self.records).push(record);
    }

    /// Audit log, oldest first.
    pub fn records(&self) -> Vec<TurnRecord> {
        lock(&self.records).clone()
    }
}
