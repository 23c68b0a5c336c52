//! Line commands accepted on stdin.

use anyhow::{anyhow, bail, Context, Result};
use tether_app::FunnelKind;
use tether_core::{NavPayload, Screen};

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Enter the consumer portal
    User,
    /// Enter the admin portal
    Admin,
    /// Back to the portal chooser
    Chooser,
    /// Sign in through the auth provider
    SignIn { user: String, password: String },
    /// Sign out and clear portal state
    SignOut,
    /// Navigate within the active portal
    Go {
        screen: Screen,
        payload: Option<NavPayload>,
    },
    /// Navigation back
    Back,
    /// Start a funnel on its host screen
    Funnel(FunnelKind),
    /// Submit the current funnel step
    Submit(String),
    /// Previous funnel step
    StepBack,
    /// Print the current view
    View,
    /// Print command list
    Help,
    /// Exit
    Quit,
}

pub const HELP: &str = "\
commands:
  user | admin | chooser          select a portal
  signin <id> <password>          sign in
  signout                         sign out
  go <screen> [json]              navigate (screen slug, optional payload)
  back                            navigate back
  funnel <phone|email|age|selfie|password-recovery>
  submit <value>                  submit the current funnel step
  step-back                       previous funnel step
  view | help | quit";

impl Command {
    /// Parse a line; blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word {
            "user" => Self::User,
            "admin" => Self::Admin,
            "chooser" => Self::Chooser,
            "signin" => {
                let mut parts = rest.split_whitespace();
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(user), Some(password), None) => Self::SignIn {
                        user: user.to_string(),
                        password: password.to_string(),
                    },
                    _ => bail!("usage: signin <id> <password>"),
                }
            }
            "signout" => Self::SignOut,
            "go" => {
                let (slug, payload) = match rest.split_once(char::is_whitespace) {
                    Some((slug, json)) => (slug, Some(json.trim())),
                    None => (rest, None),
                };
                if slug.is_empty() {
                    bail!("usage: go <screen> [json]");
                }
                let screen = slug.parse::<Screen>()?;
                let payload = payload
                    .map(serde_json::from_str::<NavPayload>)
                    .transpose()
                    .context("payload is not valid JSON")?;
                Self::Go { screen, payload }
            }
            "back" => Self::Back,
            "funnel" => {
                let kind = FunnelKind::from_label(rest)
                    .ok_or_else(|| anyhow!("unknown funnel '{rest}'"))?;
                Self::Funnel(kind)
            }
            "submit" => Self::Submit(rest.to_string()),
            "step-back" => Self::StepBack,
            "view" => Self::View,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => bail!("unknown command '{other}' (try 'help')"),
        };
        Ok(Some(command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_blank_and_comment_lines() {
        assert_eq!(Command::parse("   ").unwrap(), None);
        assert_eq!(Command::parse("# setup").unwrap(), None);
    }

    #[test]
    fn test_go_with_payload() {
        let cmd = Command::parse("go user-profile {\"id\": 7}").unwrap();
        assert_matches!(
            cmd,
            Some(Command::Go { screen: Screen::UserProfile, payload: Some(p) }) if p["id"] == 7
        );
        assert_eq!(
            Command::parse("go home").unwrap(),
            Some(Command::Go {
                screen: Screen::Home,
                payload: None
            })
        );
        assert!(Command::parse("go nowhere").is_err());
        assert!(Command::parse("go home {broken").is_err());
    }

    #[test]
    fn test_signin_and_funnel() {
        assert_eq!(
            Command::parse("signin root hunter2").unwrap(),
            Some(Command::SignIn {
                user: "root".to_string(),
                password: "hunter2".to_string()
            })
        );
        assert!(Command::parse("signin root").is_err());
        assert_eq!(
            Command::parse("funnel password-recovery").unwrap(),
            Some(Command::Funnel(FunnelKind::PasswordRecovery))
        );
        assert!(Command::parse("funnel fax").is_err());
    }

    #[test]
    fn test_submit_keeps_spaces() {
        assert_eq!(
            Command::parse("submit +1 415 555 0100").unwrap(),
            Some(Command::Submit("+1 415 555 0100".to_string()))
        );
    }
}
