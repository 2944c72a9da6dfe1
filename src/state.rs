use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

use crate::encoder::{encode_selection, Payload};
use crate::error::ExplorerError;
use crate::fee::{FeeEstimator, FeeQuote, FeeQuoteSlot};
use crate::fields::{synthesize, ParameterSpec};
use crate::form::{optional_msg, FormEvent, FormState, Selection};
use crate::schema::catalog::{list_groups, list_operations, ChoiceOption};
use crate::schema::SchemaSource;
use crate::settings::{ExplorerSettings, InteractionMode};
use crate::submission::{self, Signer, StatusBoard, StatusSink, SubmissionChannel, SubmissionStatus};

// ── Outcomes ───────────────────────────────────────────────────────

/// Result of an operator-triggered estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail")]
pub enum EstimateOutcome {
    /// Nothing was sent: no schema, incomplete selection, or arguments that
    /// don't encode yet.
    Declined,
    Updated(FeeQuote),
    /// The service answered without a fee; the previous quote stands.
    Unchanged,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail")]
pub enum SubmitOutcome {
    Declined,
    /// A terminal status arrived and the subscription was released.
    Completed(SubmissionStatus),
    /// The subscription closed on its own; carries the last status seen.
    StreamEnded(Option<SubmissionStatus>),
    Failed(String),
}

// ── Session state ──────────────────────────────────────────────────

/// One operator session: schema, form, derived fields, fee quote and
/// submission status.
pub struct ExplorerState {
    pub schema: Mutex<Option<Arc<dyn SchemaSource>>>,
    pub form: Mutex<FormState>,
    pub fields: Mutex<Vec<ParameterSpec>>,
    pub fee_quote: FeeQuoteSlot,
    pub status: StatusBoard,
    pub estimator: FeeEstimator,
    pub interaction_mode: InteractionMode,
    submission_pending: AtomicBool,
}

/// Clears the pending flag when the submission that set it finishes.
struct PendingSubmission<'a>(&'a AtomicBool);

impl Drop for PendingSubmission<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ExplorerState {
    pub fn new(settings: &ExplorerSettings) -> Self {
        Self {
            schema: Mutex::new(None),
            form: Mutex::new(FormState::new()),
            fields: Mutex::new(Vec::new()),
            fee_quote: FeeQuoteSlot::default(),
            status: StatusBoard::default(),
            estimator: FeeEstimator::new(
                &settings.estimate_base_url,
                Duration::from_secs(settings.request_timeout_secs),
            ),
            interaction_mode: settings.interaction_mode,
            submission_pending: AtomicBool::new(false),
        }
    }

    /// Read-only access to the form. Locks the mutex for the duration of `f`.
    pub fn with_form<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&FormState) -> R,
    {
        let guard = self.form.lock();
        f(&guard)
    }

    /// Mutating access to the form. Locks the mutex for the duration of `f`.
    pub fn with_form_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut FormState) -> R,
    {
        let mut guard = self.form.lock();
        f(&mut guard)
    }

    // ── Schema ─────────────────────────────────────────────────────

    pub fn connect(&self, schema: Arc<dyn SchemaSource>) {
        tracing::info!(groups = schema.groups().len(), "schema source connected");
        *self.schema.lock() = Some(schema);
        self.refresh_fields();
    }

    pub fn disconnect(&self) {
        tracing::info!("schema source disconnected");
        *self.schema.lock() = None;
        self.refresh_fields();
    }

    /// Snapshot of the connected schema. Callers hold no lock while using it.
    pub fn schema(&self) -> Option<Arc<dyn SchemaSource>> {
        self.schema.lock().clone()
    }

    pub fn group_choices(&self) -> Vec<ChoiceOption> {
        list_groups(self.schema().as_deref())
    }

    /// Operations of the currently selected group.
    pub fn operation_choices(&self) -> Vec<ChoiceOption> {
        let group = self.with_form(|f| f.selection().group.clone());
        list_operations(self.schema().as_deref(), &group)
    }

    // ── Form ───────────────────────────────────────────────────────

    pub fn selection(&self) -> Selection {
        self.with_form(|f| f.selection().clone())
    }

    pub fn fields(&self) -> Vec<ParameterSpec> {
        self.fields.lock().clone()
    }

    /// Apply a form event. A parameter edit past the current field list is
    /// dropped; the form only holds values for fields that exist.
    pub fn apply(&self, event: FormEvent) {
        if let FormEvent::ParameterChanged { index, .. } = &event {
            let field_count = self.fields.lock().len();
            if *index >= field_count {
                tracing::debug!(index, field_count, "ignoring parameter edit outside the field list");
                return;
            }
        }
        let reshapes = event.reshapes_fields();
        self.with_form_mut(|f| f.apply(event));
        if reshapes {
            self.refresh_fields();
        }
    }

    fn refresh_fields(&self) {
        let selection = self.selection();
        let fields = synthesize(self.schema().as_deref(), &selection.group, &selection.operation);
        *self.fields.lock() = fields;
    }

    pub fn optional_msg(&self) -> &'static str {
        optional_msg(self.interaction_mode)
    }

    pub fn log_selection(&self) {
        let selection = self.selection();
        tracing::info!(
            group = %selection.group,
            operation = %selection.operation,
            params = ?selection.params,
            "current selection"
        );
    }

    /// Encode the selection as it stands right now.
    pub fn current_payload(&self) -> Result<Payload, ExplorerError> {
        let schema = self.schema();
        let selection = self.selection();
        encode_selection(schema.as_deref(), &selection)
    }

    // ── Fee estimate ───────────────────────────────────────────────

    pub fn fee_quote(&self) -> Option<FeeQuote> {
        self.fee_quote.current()
    }

    pub async fn estimate(&self) -> EstimateOutcome {
        let payload = match self.current_payload() {
            Ok(payload) => payload,
            Err(e) if e.is_pre_network() => {
                tracing::debug!("estimate declined: {e}");
                return EstimateOutcome::Declined;
            }
            Err(e) => return EstimateOutcome::Failed(e.to_string()),
        };

        match self.estimator.estimate_into(&payload, &self.fee_quote).await {
            Ok(Some(quote)) => EstimateOutcome::Updated(quote),
            Ok(None) => EstimateOutcome::Unchanged,
            Err(e) => {
                tracing::warn!("{e}");
                EstimateOutcome::Failed(e.to_string())
            }
        }
    }

    // ── Submission ─────────────────────────────────────────────────

    /// Latest submission status as display text.
    pub fn status(&self) -> Option<String> {
        self.status.latest().map(|s| s.to_string())
    }

    pub fn submission_pending(&self) -> bool {
        self.submission_pending.load(Ordering::Acquire)
    }

    fn begin_submission(&self) -> Option<PendingSubmission<'_>> {
        self.submission_pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PendingSubmission(&self.submission_pending))
    }

    /// Sign and dispatch the current selection, then track it until it
    /// finalizes, errors, or its stream closes. Only one submission may be
    /// open at a time; a second one is declined.
    pub async fn submit<C: SubmissionChannel + ?Sized>(&self, signer: &dyn Signer, channel: &C) -> SubmitOutcome {
        let Some(_pending) = self.begin_submission() else {
            tracing::debug!("submit declined: {}", ExplorerError::SubmissionPending);
            return SubmitOutcome::Declined;
        };

        // Re-encode from the live form; an estimate's payload is never reused.
        let payload = match self.current_payload() {
            Ok(payload) => payload,
            Err(e) if e.is_pre_network() => {
                tracing::debug!("submit declined: {e}");
                return SubmitOutcome::Declined;
            }
            Err(e) => return SubmitOutcome::Failed(e.to_string()),
        };

        self.status.clear();
        let subscription = match submission::dispatch(&payload, signer, channel).await {
            Ok(subscription) => subscription,
            Err(e) => {
                tracing::warn!("{e}");
                self.status.emit_status(&SubmissionStatus::Error);
                return SubmitOutcome::Failed(e.to_string());
            }
        };

        match submission::track(subscription, &self.status).await {
            Some(status) if status.is_terminal() => SubmitOutcome::Completed(status),
            last => SubmitOutcome::StreamEnded(last),
        }
    }
}
