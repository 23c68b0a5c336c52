//! Interactive session: one portal switch, one auth provider and at most one
//! running funnel.

use anyhow::{bail, Result};
use std::sync::Arc;
use std::time::Duration;
use tether_app::funnel::flows;
use tether_app::{
    Credentials, FunnelController, FunnelDefinition, FunnelInput, FunnelKind, OtpCode,
    PortalMode, PortalSwitch, PortalView, SessionProvider, SimulatedAuth, SimulatedVerifier,
    StepStatus, SubmitOutcome, TetherConfig,
};
use tether_core::{BackOutcome, UserId};

use crate::commands::{Command, HELP};

/// What the caller should do after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    /// Print and keep reading
    Output(String),
    /// Stop
    Quit,
}

pub struct Shell {
    config: TetherConfig,
    auth: Arc<SimulatedAuth>,
    portal: PortalSwitch,
    funnel: Option<FunnelController<FunnelInput>>,
}

impl Shell {
    pub fn new(config: TetherConfig) -> Self {
        let auth = Arc::new(SimulatedAuth::from_config(&config.simulation));
        let portal = PortalSwitch::new(
            auth.clone(),
            config.portal.clone(),
            config.navigation.clone(),
        );
        Self {
            config,
            auth,
            portal,
            funnel: None,
        }
    }

    /// Start signed in as `user`.
    pub fn with_user(self, user: &str) -> Self {
        self.auth.force_session(UserId::new(user));
        self
    }

    /// Apply the startup query and describe the resulting view.
    pub async fn bootstrap(&mut self, query: Option<&str>) -> String {
        let session = self.auth.current_session();
        let view = self.portal.bootstrap(query, &session).await;
        render(&view)
    }

    pub async fn execute(&mut self, command: Command) -> Result<Reply> {
        self.finish_funnel();
        let session = self.auth.current_session();

        let output = match command {
            Command::User => {
                self.close_funnel();
                self.portal.enter_user(&session);
                self.describe()
            }
            Command::Admin => {
                self.close_funnel();
                self.portal.enter_admin(&session).await;
                self.describe()
            }
            Command::Chooser => {
                self.close_funnel();
                self.portal.return_to_chooser();
                self.describe()
            }
            Command::SignIn { user, password } => {
                let credentials = Credentials {
                    user_id: UserId::new(user),
                    password,
                };
                let session = self.auth.sign_in(credentials).await?;
                format!(
                    "signed in as {} ({:?})",
                    session.user_id().map(UserId::as_str).unwrap_or_default(),
                    session.role()
                )
            }
            Command::SignOut => {
                self.auth.sign_out().await?;
                self.close_funnel();
                self.portal.handle_sign_out();
                self.describe()
            }
            Command::Go { screen, payload } => {
                self.close_funnel();
                self.portal.navigate(screen, payload)?;
                self.describe()
            }
            Command::Back => {
                let outcome = self.portal.back()?;
                if !self.on_funnel_screen() {
                    self.close_funnel();
                }
                match outcome {
                    BackOutcome::Noop => format!("nothing to go back to\n{}", self.describe()),
                    _ => self.describe(),
                }
            }
            Command::Funnel(kind) => self.start_funnel(kind)?,
            Command::Submit(raw) => self.submit(&raw).await?,
            Command::StepBack => {
                let Some(funnel) = &self.funnel else {
                    bail!("no funnel running");
                };
                if funnel.back() {
                    self.describe()
                } else {
                    "already on the first step".to_string()
                }
            }
            Command::View => self.describe(),
            Command::Help => HELP.to_string(),
            Command::Quit => return Ok(Reply::Quit),
        };
        Ok(Reply::Output(output))
    }

    fn start_funnel(&mut self, kind: FunnelKind) -> Result<String> {
        if self.portal.mode() != PortalMode::User {
            bail!("funnels run in the user portal");
        }
        self.close_funnel();

        let funnels = &self.config.funnels;
        let mut code = None;
        let definition: FunnelDefinition<FunnelInput> = match kind {
            FunnelKind::PhoneVerification => flows::phone_verification(self.send_code(&mut code))?,
            FunnelKind::EmailVerification => flows::email_verification(self.send_code(&mut code))?,
            FunnelKind::AgeVerification => flows::age_verification(
                chrono::Local::now().date_naive(),
                funnels.min_age,
                funnels.max_image_bytes,
            )?,
            FunnelKind::SelfieVerification => {
                flows::selfie_verification(funnels.max_image_bytes)?
            }
            FunnelKind::PasswordRecovery => flows::password_recovery(self.send_code(&mut code))?,
        };

        self.portal.navigate(kind.host_screen(), None)?;
        let verifier = Arc::new(SimulatedVerifier::<FunnelInput>::new(Duration::from_millis(
            self.config.simulation.verify_latency_ms,
        )));
        self.funnel = Some(
            FunnelController::new(definition, funnels.settle_delay()).with_verifier(verifier),
        );

        let mut out = self.describe();
        if let Some(code) = code {
            out.push_str(&format!("\n(simulated delivery) your code is {}", code.as_str()));
        }
        Ok(out)
    }

    fn send_code(&self, slot: &mut Option<OtpCode>) -> OtpCode {
        let code = OtpCode::generate(&mut rand::thread_rng());
        tracing::debug!("one-time code issued");
        *slot = Some(code.clone());
        code
    }

    async fn submit(&mut self, raw: &str) -> Result<String> {
        let Some(funnel) = &self.funnel else {
            bail!("no funnel running");
        };
        let Some(step) = funnel.current_step() else {
            bail!("funnel already complete");
        };
        let Some(input) = FunnelInput::from_text(step.input(), raw) else {
            bail!("could not read '{raw}' as {:?}", step.input());
        };

        let outcome = funnel.submit_step(input).await;
        let line = match &outcome {
            SubmitOutcome::Verified { .. } => "verified".to_string(),
            SubmitOutcome::Failed(error) => format!("failed: {error}"),
            SubmitOutcome::Ignored(reason) => format!("ignored ({reason:?})"),
        };
        self.finish_funnel();
        Ok(format!("{line}\n{}", self.describe()))
    }

    /// Leave a completed funnel for its exit screen.
    fn finish_funnel(&mut self) {
        let Some(kind) = self
            .funnel
            .as_ref()
            .filter(|f| f.is_complete())
            .map(FunnelController::kind)
        else {
            return;
        };
        self.close_funnel();
        if let Err(error) = self.portal.navigate(kind.exit_screen(), None) {
            tracing::warn!(funnel = %kind, %error, "could not leave completed funnel");
        }
    }

    fn close_funnel(&mut self) {
        if let Some(funnel) = self.funnel.take() {
            funnel.close();
        }
    }

    fn on_funnel_screen(&self) -> bool {
        let current = self.portal.navigation().map(|nav| nav.current());
        self.funnel
            .as_ref()
            .is_some_and(|f| Some(f.kind().host_screen()) == current)
    }

    fn describe(&self) -> String {
        let mut out = render(&self.portal.view());
        if let Some(nav) = self.portal.navigation() {
            out.push_str(&format!("  [history {}]", nav.history_len()));
        }
        if let Some(funnel) = &self.funnel {
            let state = funnel.state();
            let total = funnel.definition().steps().len();
            match funnel.current_step() {
                Some(step) => out.push_str(&format!(
                    "\n  {} funnel: step {}/{} '{}' ({})",
                    funnel.kind(),
                    state.step_index + 1,
                    total,
                    step.title(),
                    status_label(state.step_status),
                )),
                None => out.push_str(&format!("\n  {} funnel: complete", funnel.kind())),
            }
            if let Some(error) = state.step_error {
                out.push_str(&format!("\n  last error: {error}"));
            }
        }
        out
    }
}

fn status_label(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Idle => "waiting for input",
        StepStatus::Submitting => "checking",
        StepStatus::Verified => "verified",
        StepStatus::Failed => "try again",
    }
}

/// One-line description of a portal view.
pub fn render(view: &PortalView) -> String {
    match view {
        PortalView::Chooser => "portal chooser: type 'user' or 'admin'".to_string(),
        PortalView::User(screen) => format!("user › {} ({})", screen.title(), screen),
        PortalView::AdminPending(state) => format!("admin › checking access ({state:?})"),
        PortalView::AccessDenied(denial) => format!(
            "access denied [{}]: {}. Type 'chooser' to return",
            denial.label(),
            denial.user_message()
        ),
        PortalView::Admin(screen) => format!("admin › {} ({})", screen.title(), screen),
    }
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("portal", &self.portal)
            .field("funnel", &self.funnel.as_ref().map(FunnelController::kind))
            .finish_non_exhaustive()
    }
}
