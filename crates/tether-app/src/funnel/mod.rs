//! # Funnel Controller
//!
//! Linear, single-purpose step machines used for identity verification and
//! password recovery. A funnel keeps its own step index and never touches the
//! navigation history; leaving a funnel entirely is the enclosing navigation
//! controller's `back()`.
//!
//! ## Step lifecycle
//!
//! ```text
//! Idle ──submit──▶ Submitting ──predicate + verifier ok──▶ Verified ──settle──▶ next step (Idle)
//!   ▲                  │                                                    └─▶ Complete
//!   └──── Failed ◀─────┘ (predicate false, verifier rejects or errors)
//! ```
//!
//! A step can only reach `Verified` when its predicate accepts the exact
//! submitted value. At most one submission is in flight per funnel; anything
//! submitted while `Submitting` or while a verified step is settling is
//! ignored. `back()`, `close()` and drop cancel the pending settle timer, and
//! an epoch check discards verifier results that arrive after the step moved.
//! A submission whose future is dropped before the verifier answers leaves the
//! step `Failed`, so it can be resubmitted.

pub mod flows;
pub mod otp;

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tether_core::Screen;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::effects::StepVerifier;

/// Identifier of a step within a funnel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StepId(pub &'static str);

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Where a verified step leads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepTarget {
    /// Continue with the named step
    Step(StepId),
    /// Funnel finished
    Complete,
}

/// Input a step expects, for the form renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputShape {
    /// Free text up to a length
    Text {
        /// Maximum characters
        max_len: usize,
    },
    /// Fixed-length numeric code
    Digits {
        /// Number of digits
        len: usize,
    },
    /// Calendar date
    Date,
    /// Uploaded or captured image
    Image {
        /// Maximum encoded size
        max_bytes: usize,
    },
    /// Confirmation tap, no data
    Acknowledge,
    /// Password with confirmation
    PasswordPair,
}

/// Which built-in funnel a definition implements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FunnelKind {
    /// Phone number + SMS code
    PhoneVerification,
    /// Email address + emailed code
    EmailVerification,
    /// Birth date + ID document
    AgeVerification,
    /// Liveness selfie
    SelfieVerification,
    /// Email + code + new password
    PasswordRecovery,
}

impl FunnelKind {
    /// All funnel kinds
    pub fn all() -> &'static [Self] {
        &[
            Self::PhoneVerification,
            Self::EmailVerification,
            Self::AgeVerification,
            Self::SelfieVerification,
            Self::PasswordRecovery,
        ]
    }

    /// Short label for logs and commands
    pub fn label(self) -> &'static str {
        match self {
            Self::PhoneVerification => "phone",
            Self::EmailVerification => "email",
            Self::AgeVerification => "age",
            Self::SelfieVerification => "selfie",
            Self::PasswordRecovery => "password-recovery",
        }
    }

    /// Parse a label
    pub fn from_label(label: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.label() == label)
    }

    /// Screen that hosts this funnel
    pub fn host_screen(self) -> Screen {
        match self {
            Self::PhoneVerification => Screen::PhoneVerification,
            Self::EmailVerification => Screen::EmailVerification,
            Self::AgeVerification => Screen::AgeVerification,
            Self::SelfieVerification => Screen::SelfieVerification,
            Self::PasswordRecovery => Screen::ForgotPassword,
        }
    }

    /// Screen to show once the funnel completes
    pub fn exit_screen(self) -> Screen {
        match self {
            Self::PasswordRecovery => Screen::SignIn,
            _ => Screen::VerificationComplete,
        }
    }
}

impl fmt::Display for FunnelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Malformed funnel definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FunnelError {
    /// No steps
    #[error("funnel has no steps")]
    Empty,
    /// Two steps share an id
    #[error("step '{0}' is defined twice")]
    DuplicateStep(StepId),
    /// `next` names a step that does not exist
    #[error("step '{from}' continues to unknown step '{to}'")]
    UnknownStep {
        /// Referring step
        from: StepId,
        /// Missing target
        to: StepId,
    },
    /// `next` names the same or an earlier step
    #[error("step '{from}' continues backwards to '{to}'")]
    BackwardStep {
        /// Referring step
        from: StepId,
        /// Earlier target
        to: StepId,
    },
}

/// Why a submission did not verify. Kept on the step until resubmission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StepError {
    /// The step predicate rejected the input
    #[error("invalid input for '{step}'")]
    InvalidInput {
        /// Failing step
        step: StepId,
    },
    /// The external check answered no
    #[error("'{step}' was not accepted")]
    Rejected {
        /// Failing step
        step: StepId,
    },
    /// The external check failed
    #[error("could not verify '{step}': {reason}")]
    VerificationFailed {
        /// Failing step
        step: StepId,
        /// Collaborator error message
        reason: String,
    },
}

type Validator<I> = Arc<dyn Fn(&I) -> bool + Send + Sync>;

/// One step of a funnel.
pub struct StepDescriptor<I> {
    id: StepId,
    title: &'static str,
    input: InputShape,
    validate: Validator<I>,
    next: StepTarget,
}

impl<I> StepDescriptor<I> {
    /// Create a terminal step; chain [`StepDescriptor::then`] to continue.
    pub fn new(
        id: &'static str,
        title: &'static str,
        input: InputShape,
        validate: impl Fn(&I) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: StepId(id),
            title,
            input,
            validate: Arc::new(validate),
            next: StepTarget::Complete,
        }
    }

    /// Continue with another step once verified
    pub fn then(mut self, next: &'static str) -> Self {
        self.next = StepTarget::Step(StepId(next));
        self
    }

    /// Step id
    pub fn id(&self) -> StepId {
        self.id
    }

    /// Display title
    pub fn title(&self) -> &'static str {
        self.title
    }

    /// Expected input
    pub fn input(&self) -> InputShape {
        self.input
    }

    /// Where this step leads
    pub fn next(&self) -> StepTarget {
        self.next
    }

    /// Run the step predicate
    pub fn validate(&self, input: &I) -> bool {
        (self.validate)(input)
    }
}

impl<I> fmt::Debug for StepDescriptor<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDescriptor")
            .field("id", &self.id)
            .field("input", &self.input)
            .field("next", &self.next)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ResolvedNext {
    Step(usize),
    Complete,
}

/// Validated, ordered list of steps.
#[derive(Debug)]
pub struct FunnelDefinition<I> {
    kind: FunnelKind,
    steps: Vec<StepDescriptor<I>>,
    next: Vec<ResolvedNext>,
}

impl<I> FunnelDefinition<I> {
    /// Validate and resolve a list of steps.
    pub fn new(kind: FunnelKind, steps: Vec<StepDescriptor<I>>) -> Result<Self, FunnelError> {
        if steps.is_empty() {
            return Err(FunnelError::Empty);
        }

        for (i, step) in steps.iter().enumerate() {
            if steps[..i].iter().any(|s| s.id == step.id) {
                return Err(FunnelError::DuplicateStep(step.id));
            }
        }

        let next = steps
            .iter()
            .enumerate()
            .map(|(i, step)| match step.next {
                StepTarget::Complete => Ok(ResolvedNext::Complete),
                StepTarget::Step(to) => {
                    let j = steps.iter().position(|s| s.id == to).ok_or(
                        FunnelError::UnknownStep {
                            from: step.id,
                            to,
                        },
                    )?;
                    if j <= i {
                        return Err(FunnelError::BackwardStep { from: step.id, to });
                    }
                    Ok(ResolvedNext::Step(j))
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { kind, steps, next })
    }

    /// Funnel kind
    pub fn kind(&self) -> FunnelKind {
        self.kind
    }

    /// Steps in order
    pub fn steps(&self) -> &[StepDescriptor<I>] {
        &self.steps
    }
}

/// Status of the current step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StepStatus {
    /// Awaiting input
    #[default]
    Idle,
    /// Validation or external check in flight
    Submitting,
    /// Accepted; advancing after the settle delay
    Verified,
    /// Rejected; input may be resubmitted
    Failed,
}

/// Snapshot of a funnel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FunnelState {
    /// Index of the current step
    pub step_index: usize,
    /// Status of the current step
    pub step_status: StepStatus,
    /// Last failure on the current step
    pub step_error: Option<StepError>,
    /// Every step verified
    pub completed: bool,
}

/// Why a submission was not processed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Another submission is in flight
    InFlight,
    /// The step is verified and about to advance
    Settling,
    /// The funnel already completed
    Completed,
    /// The funnel was closed
    Closed,
    /// The step moved while this submission was in flight
    Superseded,
}

/// Result of [`FunnelController::submit_step`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Step accepted
    Verified {
        /// Where the funnel goes next
        next: StepTarget,
    },
    /// Step rejected; still on the same step
    Failed(StepError),
    /// Not processed
    Ignored(IgnoreReason),
}

struct FunnelInner {
    state: FunnelState,
    epoch: u64,
    closed: bool,
    settle: Option<JoinHandle<()>>,
}

impl FunnelInner {
    fn busy(&self) -> Option<IgnoreReason> {
        if self.closed {
            Some(IgnoreReason::Closed)
        } else if self.state.completed {
            Some(IgnoreReason::Completed)
        } else {
            match self.state.step_status {
                StepStatus::Submitting => Some(IgnoreReason::InFlight),
                StepStatus::Verified => Some(IgnoreReason::Settling),
                StepStatus::Idle | StepStatus::Failed => None,
            }
        }
    }

    fn cancel_settle(&mut self) {
        if let Some(handle) = self.settle.take() {
            handle.abort();
        }
    }

    fn advance(&mut self, next: ResolvedNext) {
        self.settle = None;
        match next {
            ResolvedNext::Step(index) => {
                self.state.step_index = index;
                self.state.step_status = StepStatus::Idle;
                self.state.step_error = None;
            }
            ResolvedNext::Complete => {
                self.state.completed = true;
            }
        }
    }
}

/// Drives one invocation of a funnel.
pub struct FunnelController<I> {
    definition: FunnelDefinition<I>,
    verifier: Option<Arc<dyn StepVerifier<I>>>,
    settle_delay: Duration,
    inner: Arc<Mutex<FunnelInner>>,
}

impl<I> FunnelController<I>
where
    I: Send + Sync + 'static,
{
    /// Start a funnel at its first step.
    pub fn new(definition: FunnelDefinition<I>, settle_delay: Duration) -> Self {
        Self {
            definition,
            verifier: None,
            settle_delay,
            inner: Arc::new(Mutex::new(FunnelInner {
                state: FunnelState::default(),
                epoch: 0,
                closed: false,
                settle: None,
            })),
        }
    }

    /// Run an external check after each step's predicate passes.
    pub fn with_verifier(mut self, verifier: Arc<dyn StepVerifier<I>>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    /// Funnel kind
    pub fn kind(&self) -> FunnelKind {
        self.definition.kind
    }

    /// Underlying definition
    pub fn definition(&self) -> &FunnelDefinition<I> {
        &self.definition
    }

    /// Snapshot of the current state
    pub fn state(&self) -> FunnelState {
        self.inner.lock().state.clone()
    }

    /// Check if every step has been verified
    pub fn is_complete(&self) -> bool {
        self.inner.lock().state.completed
    }

    /// Step awaiting input, or `None` once complete
    pub fn current_step(&self) -> Option<&StepDescriptor<I>> {
        let state = self.state();
        if state.completed {
            None
        } else {
            self.definition.steps.get(state.step_index)
        }
    }

    /// Submit input for the current step.
    pub async fn submit_step(&self, input: I) -> SubmitOutcome {
        let (epoch, index) = {
            let mut inner = self.inner.lock();
            if let Some(reason) = inner.busy() {
                tracing::debug!(funnel = %self.kind(), ?reason, "submission ignored");
                return SubmitOutcome::Ignored(reason);
            }
            inner.epoch += 1;
            inner.state.step_status = StepStatus::Submitting;
            inner.state.step_error = None;
            (inner.epoch, inner.state.step_index)
        };

        let step = &self.definition.steps[index];
        let mut pending = PendingSubmission {
            inner: &self.inner,
            epoch,
            step: step.id,
            armed: true,
        };
        let verdict = if !step.validate(&input) {
            Err(StepError::InvalidInput { step: step.id })
        } else if let Some(verifier) = &self.verifier {
            match verifier.verify(step.id, &input).await {
                Ok(true) => Ok(()),
                Ok(false) => Err(StepError::Rejected { step: step.id }),
                Err(e) => Err(StepError::VerificationFailed {
                    step: step.id,
                    reason: e.to_string(),
                }),
            }
        } else {
            Ok(())
        };
        pending.armed = false;

        let mut inner = self.inner.lock();
        if inner.closed || inner.epoch != epoch {
            tracing::debug!(funnel = %self.kind(), step = %step.id, "discarding stale verification result");
            return SubmitOutcome::Ignored(IgnoreReason::Superseded);
        }

        match verdict {
            Err(error) => {
                tracing::debug!(funnel = %self.kind(), %error, "step failed");
                inner.state.step_status = StepStatus::Failed;
                inner.state.step_error = Some(error.clone());
                SubmitOutcome::Failed(error)
            }
            Ok(()) => {
                tracing::debug!(funnel = %self.kind(), step = %step.id, "step verified");
                inner.state.step_status = StepStatus::Verified;
                self.schedule_advance(&mut inner, epoch, index);
                SubmitOutcome::Verified { next: step.next }
            }
        }
    }

    /// Return to the previous step. Returns `false` on the first step.
    pub fn back(&self) -> bool {
        let mut inner = self.inner.lock();
        if inner.closed || inner.state.completed || inner.state.step_index == 0 {
            return false;
        }
        inner.cancel_settle();
        inner.epoch += 1;
        inner.state.step_index -= 1;
        inner.state.step_status = StepStatus::Idle;
        inner.state.step_error = None;
        tracing::debug!(funnel = %self.kind(), step_index = inner.state.step_index, "funnel back");
        true
    }

    /// Tear the funnel down, cancelling any pending advance.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.cancel_settle();
        inner.epoch += 1;
        inner.closed = true;
    }

    fn schedule_advance(&self, inner: &mut FunnelInner, epoch: u64, index: usize) {
        let next = self.definition.next[index];
        let kind = self.kind();

        if self.settle_delay.is_zero() {
            inner.advance(next);
            log_advance(kind, next);
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(funnel = %kind, "no runtime for settle timer; advancing immediately");
            inner.advance(next);
            log_advance(kind, next);
            return;
        };

        let shared = Arc::clone(&self.inner);
        let delay = self.settle_delay;
        inner.settle = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let mut inner = shared.lock();
            if !inner.closed && inner.epoch == epoch {
                inner.advance(next);
                log_advance(kind, next);
            }
        }));
    }
}

/// Fails the step if a `submit_step` future is dropped mid-verification.
struct PendingSubmission<'a> {
    inner: &'a Mutex<FunnelInner>,
    epoch: u64,
    step: StepId,
    armed: bool,
}

impl Drop for PendingSubmission<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.inner.lock();
        if !inner.closed
            && inner.epoch == self.epoch
            && inner.state.step_status == StepStatus::Submitting
        {
            tracing::debug!(step = %self.step, "submission cancelled mid-verification");
            inner.state.step_status = StepStatus::Failed;
            inner.state.step_error = Some(StepError::VerificationFailed {
                step: self.step,
                reason: "submission cancelled".to_string(),
            });
        }
    }
}

fn log_advance(kind: FunnelKind, next: ResolvedNext) {
    match next {
        ResolvedNext::Complete => tracing::info!(funnel = %kind, "funnel complete"),
        ResolvedNext::Step(index) => {
            tracing::debug!(funnel = %kind, step_index = index, "funnel advanced");
        }
    }
}

impl<I> Drop for FunnelController<I> {
    fn drop(&mut self) {
        self.inner.lock().cancel_settle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn two_steps() -> FunnelDefinition<String> {
        FunnelDefinition::new(
            FunnelKind::EmailVerification,
            vec![
                StepDescriptor::new("first", "First", InputShape::Text { max_len: 8 }, |s: &String| {
                    s == "ok"
                })
                .then("second"),
                StepDescriptor::new("second", "Second", InputShape::Acknowledge, |_: &String| true),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_definition_rejects_bad_links() {
        let empty: Result<FunnelDefinition<String>, _> =
            FunnelDefinition::new(FunnelKind::PhoneVerification, vec![]);
        assert_matches!(empty, Err(FunnelError::Empty));

        let unknown = FunnelDefinition::new(
            FunnelKind::PhoneVerification,
            vec![StepDescriptor::new("a", "A", InputShape::Date, |_: &String| true).then("zzz")],
        );
        assert_matches!(unknown, Err(FunnelError::UnknownStep { .. }));

        let backwards = FunnelDefinition::new(
            FunnelKind::PhoneVerification,
            vec![
                StepDescriptor::new("a", "A", InputShape::Date, |_: &String| true).then("b"),
                StepDescriptor::new("b", "B", InputShape::Date, |_: &String| true).then("a"),
            ],
        );
        assert_matches!(backwards, Err(FunnelError::BackwardStep { .. }));

        let duplicate = FunnelDefinition::new(
            FunnelKind::PhoneVerification,
            vec![
                StepDescriptor::new("a", "A", InputShape::Date, |_: &String| true),
                StepDescriptor::new("a", "A", InputShape::Date, |_: &String| true),
            ],
        );
        assert_matches!(duplicate, Err(FunnelError::DuplicateStep(StepId("a"))));
    }

    #[tokio::test]
    async fn test_invalid_input_fails_and_allows_resubmission() {
        let funnel = FunnelController::new(two_steps(), Duration::ZERO);

        let outcome = funnel.submit_step("nope".to_string()).await;
        assert_eq!(
            outcome,
            SubmitOutcome::Failed(StepError::InvalidInput { step: StepId("first") })
        );
        let state = funnel.state();
        assert_eq!(state.step_status, StepStatus::Failed);
        assert_eq!(state.step_index, 0);
        assert!(state.step_error.is_some());

        let outcome = funnel.submit_step("ok".to_string()).await;
        assert_eq!(
            outcome,
            SubmitOutcome::Verified {
                next: StepTarget::Step(StepId("second"))
            }
        );
        assert_eq!(funnel.state().step_index, 1);
        assert_eq!(funnel.state().step_status, StepStatus::Idle);
    }

    #[tokio::test]
    async fn test_completion_and_back() {
        let funnel = FunnelController::new(two_steps(), Duration::ZERO);
        assert!(!funnel.back());

        funnel.submit_step("ok".to_string()).await;
        assert!(funnel.back());
        assert_eq!(funnel.state().step_index, 0);

        funnel.submit_step("ok".to_string()).await;
        funnel.submit_step(String::new()).await;
        assert!(funnel.is_complete());
        assert!(funnel.current_step().is_none());
        assert_eq!(
            funnel.submit_step("ok".to_string()).await,
            SubmitOutcome::Ignored(IgnoreReason::Completed)
        );
        assert!(!funnel.back());
    }

    #[tokio::test]
    async fn test_closed_funnel_ignores_input() {
        let funnel = FunnelController::new(two_steps(), Duration::ZERO);
        funnel.close();
        assert_eq!(
            funnel.submit_step("ok".to_string()).await,
            SubmitOutcome::Ignored(IgnoreReason::Closed)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_aborts_settle_timer() {
        let funnel = FunnelController::new(two_steps(), Duration::from_millis(100));
        let shared = Arc::clone(&funnel.inner);

        funnel.submit_step("ok".to_string()).await;
        assert_eq!(shared.lock().state.step_status, StepStatus::Verified);
        assert!(shared.lock().settle.is_some());

        drop(funnel);
        assert!(shared.lock().settle.is_none());

        tokio::time::sleep(Duration::from_millis(250)).await;
        let inner = shared.lock();
        assert_eq!(inner.state.step_index, 0);
        assert_eq!(inner.state.step_status, StepStatus::Verified);
        assert!(!inner.state.completed);
    }

    #[test]
    fn test_kind_labels_round_trip() {
        for kind in FunnelKind::all() {
            assert_eq!(FunnelKind::from_label(kind.label()), Some(*kind));
        }
        assert_eq!(FunnelKind::PasswordRecovery.exit_screen(), Screen::SignIn);
    }
}
