//! Built-in funnels
//!
//! Step lists for the verification funnels and password recovery. All of them
//! share [`FunnelInput`] so a single form renderer can drive any funnel.

use chrono::{Datelike, NaiveDate};

use super::otp::{OtpCode, OTP_LEN};
use super::{FunnelDefinition, FunnelError, FunnelKind, InputShape, StepDescriptor};

/// Minimum password length for recovery
pub const MIN_PASSWORD_LEN: usize = 8;

const MAX_TEXT_LEN: usize = 254;

/// Longest phone entry, separators included
pub const PHONE_MAX_LEN: usize = 20;

/// Value submitted for a funnel step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FunnelInput {
    /// Phone number, email address or other free text
    Text(String),
    /// One-time code
    Code(String),
    /// Date of birth
    BirthDate(NaiveDate),
    /// Encoded image
    Image(Vec<u8>),
    /// Confirmation with no data
    Acknowledge,
    /// New password and its confirmation
    NewPassword {
        /// Chosen password
        password: String,
        /// Repeated password
        confirmation: String,
    },
}

impl FunnelInput {
    /// Build the input a step expects from a line of text.
    ///
    /// The text is taken as submitted; callers strip line endings. Dates use
    /// `YYYY-MM-DD`; password pairs are two whitespace-separated words; images
    /// take the raw bytes of the text.
    pub fn from_text(shape: InputShape, raw: &str) -> Option<Self> {
        match shape {
            InputShape::Text { .. } => Some(Self::Text(raw.to_string())),
            InputShape::Digits { .. } => Some(Self::Code(raw.to_string())),
            InputShape::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(Self::BirthDate),
            InputShape::Image { .. } => Some(Self::Image(raw.as_bytes().to_vec())),
            InputShape::Acknowledge => Some(Self::Acknowledge),
            InputShape::PasswordPair => {
                let mut parts = raw.split_whitespace();
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(password), Some(confirmation), None) => Some(Self::NewPassword {
                        password: password.to_string(),
                        confirmation: confirmation.to_string(),
                    }),
                    _ => None,
                }
            }
        }
    }
}

/// Phone number with optional leading `+`, 8 to 15 digits, common separators
/// allowed, at most [`PHONE_MAX_LEN`] characters in all.
pub fn is_valid_phone(raw: &str) -> bool {
    if raw.chars().count() > PHONE_MAX_LEN {
        return false;
    }
    let rest = raw.strip_prefix('+').unwrap_or(raw);
    let mut digits = 0;
    for c in rest.chars() {
        match c {
            '0'..='9' => digits += 1,
            ' ' | '-' | '.' | '(' | ')' => {}
            _ => return false,
        }
    }
    (8..=15).contains(&digits)
}

/// Minimal structural email check: `local@domain.tld`, no whitespace.
pub fn is_valid_email(s: &str) -> bool {
    if s.is_empty() || s.len() > MAX_TEXT_LEN || s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

/// Age in whole years on `today`, or `None` for a birth date in the future.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> Option<u32> {
    if birth > today {
        return None;
    }
    let mut years = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

/// At least [`MIN_PASSWORD_LEN`] characters with a letter and a digit.
pub fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(char::is_alphabetic)
        && password.chars().any(|c| c.is_ascii_digit())
}

fn code_step(id: &'static str, title: &'static str, expected: OtpCode) -> StepDescriptor<FunnelInput> {
    StepDescriptor::new(
        id,
        title,
        InputShape::Digits { len: OTP_LEN },
        move |input: &FunnelInput| matches!(input, FunnelInput::Code(code) if expected.matches(code)),
    )
}

fn image_step(
    id: &'static str,
    title: &'static str,
    max_bytes: usize,
) -> StepDescriptor<FunnelInput> {
    StepDescriptor::new(id, title, InputShape::Image { max_bytes }, move |input: &FunnelInput| {
        matches!(input, FunnelInput::Image(bytes) if !bytes.is_empty() && bytes.len() <= max_bytes)
    })
}

fn acknowledge_step(id: &'static str, title: &'static str) -> StepDescriptor<FunnelInput> {
    StepDescriptor::new(id, title, InputShape::Acknowledge, |input: &FunnelInput| {
        matches!(input, FunnelInput::Acknowledge)
    })
}

/// Phone number, then the code sent to it.
pub fn phone_verification(expected: OtpCode) -> Result<FunnelDefinition<FunnelInput>, FunnelError> {
    FunnelDefinition::new(
        FunnelKind::PhoneVerification,
        vec![
            StepDescriptor::new(
                "enter-phone",
                "Your phone number",
                InputShape::Text { max_len: PHONE_MAX_LEN },
                |input: &FunnelInput| matches!(input, FunnelInput::Text(phone) if is_valid_phone(phone)),
            )
            .then("enter-code"),
            code_step("enter-code", "Enter the code we texted you", expected),
        ],
    )
}

/// Email address, then the code sent to it.
pub fn email_verification(expected: OtpCode) -> Result<FunnelDefinition<FunnelInput>, FunnelError> {
    FunnelDefinition::new(
        FunnelKind::EmailVerification,
        vec![
            StepDescriptor::new(
                "enter-email",
                "Your email address",
                InputShape::Text { max_len: MAX_TEXT_LEN },
                |input: &FunnelInput| matches!(input, FunnelInput::Text(email) if is_valid_email(email)),
            )
            .then("enter-code"),
            code_step("enter-code", "Enter the code we emailed you", expected),
        ],
    )
}

/// Birth date meeting the minimum age, then an ID document.
pub fn age_verification(
    today: NaiveDate,
    min_age: u32,
    max_image_bytes: usize,
) -> Result<FunnelDefinition<FunnelInput>, FunnelError> {
    FunnelDefinition::new(
        FunnelKind::AgeVerification,
        vec![
            StepDescriptor::new("birth-date", "Date of birth", InputShape::Date, move |input: &FunnelInput| {
                matches!(
                    input,
                    FunnelInput::BirthDate(birth)
                        if age_on(*birth, today).is_some_and(|age| age >= min_age)
                )
            })
            .then("id-document"),
            image_step("id-document", "Photo of your ID", max_image_bytes),
        ],
    )
}

/// Instructions, capture, review.
pub fn selfie_verification(
    max_image_bytes: usize,
) -> Result<FunnelDefinition<FunnelInput>, FunnelError> {
    FunnelDefinition::new(
        FunnelKind::SelfieVerification,
        vec![
            acknowledge_step("instructions", "Good light, no sunglasses").then("capture"),
            image_step("capture", "Take a selfie", max_image_bytes).then("review"),
            acknowledge_step("review", "Looks good?"),
        ],
    )
}

/// Account email, emailed code, new password.
pub fn password_recovery(expected: OtpCode) -> Result<FunnelDefinition<FunnelInput>, FunnelError> {
    FunnelDefinition::new(
        FunnelKind::PasswordRecovery,
        vec![
            StepDescriptor::new(
                "account-email",
                "Email for your account",
                InputShape::Text { max_len: MAX_TEXT_LEN },
                |input: &FunnelInput| matches!(input, FunnelInput::Text(email) if is_valid_email(email)),
            )
            .then("reset-code"),
            code_step("reset-code", "Enter your reset code", expected).then("new-password"),
            StepDescriptor::new(
                "new-password",
                "Choose a new password",
                InputShape::PasswordPair,
                |input: &FunnelInput| {
                    matches!(
                        input,
                        FunnelInput::NewPassword { password, confirmation }
                            if password == confirmation && is_strong_password(password)
                    )
                },
            ),
        ],
    )
}
