//! # Screen Registry
//!
//! The closed set of addressable screens and the render spec each resolves to.
//!
//! Every screen belongs to exactly one [`Portal`] and one [`Flow`]. The flow is
//! what the navigation controller consults when deciding whether a transition
//! into a *shared* screen should be remembered as that screen's return target.

use crate::errors::ScreenParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Top-level portal a screen belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Portal {
    /// Consumer-facing portal
    User,
    /// Privileged admin portal, gated by the access gate
    Admin,
}

impl Portal {
    /// Screen a portal is entered on and the generic "back" default for
    /// screens that have no more specific parent.
    pub fn home(self) -> Screen {
        match self {
            Portal::User => Screen::Home,
            Portal::Admin => Screen::AdminDashboard,
        }
    }

    /// Short label for logs.
    pub fn label(self) -> &'static str {
        match self {
            Portal::User => "user",
            Portal::Admin => "admin",
        }
    }
}

impl fmt::Display for Portal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Logical flow a screen is part of.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Flow {
    /// Sign-in, sign-up and first-run profile setup
    Onboarding,
    /// Home, inbox, account and settings
    Main,
    /// Identity verification hub and funnels
    Verification,
    /// Friend/expert rental
    Rental,
    /// Business networking
    Networking,
    /// Blind-date matching
    Dating,
    /// Screens reachable from more than one flow
    Shared,
    /// Admin portal
    Admin,
}

/// Render spec a screen resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenSpec {
    /// Owning portal
    pub portal: Portal,
    /// Owning flow
    pub flow: Flow,
    /// Human-readable title
    pub title: &'static str,
}

macro_rules! define_screens {
    ($(
        $(#[$meta:meta])*
        $variant:ident => $slug:literal, $portal:ident, $flow:ident, $title:literal;
    )+) => {
        /// Screen identifiers for navigation
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "kebab-case")]
        pub enum Screen {
            $(
                $(#[$meta])*
                $variant,
            )+
        }

        impl Screen {
            const ALL: &'static [Screen] = &[$(Screen::$variant),+];

            /// Get all screens in declaration order
            pub fn all() -> &'static [Screen] {
                Self::ALL
            }

            /// Stable kebab-case identifier
            pub fn slug(self) -> &'static str {
                match self {
                    $(Screen::$variant => $slug,)+
                }
            }

            /// Resolve the render spec for this screen
            pub fn spec(self) -> ScreenSpec {
                match self {
                    $(Screen::$variant => ScreenSpec {
                        portal: Portal::$portal,
                        flow: Flow::$flow,
                        title: $title,
                    },)+
                }
            }
        }

        impl FromStr for Screen {
            type Err = ScreenParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($slug => Ok(Screen::$variant),)+
                    other => Err(ScreenParseError::Unknown(other.to_string())),
                }
            }
        }
    };
}

define_screens! {
    // Onboarding
    /// Launch splash
    Splash => "splash", User, Onboarding, "Tether";
    /// Signed-out landing page
    Welcome => "welcome", User, Onboarding, "Welcome";
    SignIn => "sign-in", User, Onboarding, "Sign In";
    SignUp => "sign-up", User, Onboarding, "Create Account";
    /// Hosts the password recovery funnel
    ForgotPassword => "forgot-password", User, Onboarding, "Reset Password";
    OnboardingProfile => "onboarding-profile", User, Onboarding, "About You";
    OnboardingInterests => "onboarding-interests", User, Onboarding, "Your Interests";
    OnboardingPhotos => "onboarding-photos", User, Onboarding, "Add Photos";
    OnboardingComplete => "onboarding-complete", User, Onboarding, "You're All Set";

    // Main
    /// Signed-in home (user portal generic default)
    Home => "home", User, Main, "Home";
    Search => "search", User, Main, "Search";
    Notifications => "notifications", User, Main, "Notifications";
    Inbox => "inbox", User, Main, "Messages";
    Conversation => "conversation", User, Main, "Conversation";
    MyProfile => "my-profile", User, Main, "My Profile";
    EditProfile => "edit-profile", User, Main, "Edit Profile";
    Settings => "settings", User, Main, "Settings";
    AccountSecurity => "account-security", User, Main, "Security";
    Wallet => "wallet", User, Main, "Wallet";
    TopUp => "top-up", User, Main, "Add Funds";
    Help => "help", User, Main, "Help Center";
    Terms => "terms", User, Main, "Terms of Service";
    PrivacyPolicy => "privacy-policy", User, Main, "Privacy Policy";

    // Verification
    VerificationHub => "verification-hub", User, Verification, "Verify Your Identity";
    PhoneVerification => "phone-verification", User, Verification, "Verify Phone";
    EmailVerification => "email-verification", User, Verification, "Verify Email";
    AgeVerification => "age-verification", User, Verification, "Verify Age";
    SelfieVerification => "selfie-verification", User, Verification, "Selfie Check";
    VerificationComplete => "verification-complete", User, Verification, "Verified";

    // Rental
    RentalHome => "rental-home", User, Rental, "Rent a Friend";
    RentalCategory => "rental-category", User, Rental, "Categories";
    FriendList => "friend-list", User, Rental, "Friends Nearby";
    ExpertList => "expert-list", User, Rental, "Experts";
    BookingRequest => "booking-request", User, Rental, "Request Booking";
    BookingConfirm => "booking-confirm", User, Rental, "Confirm Booking";
    BookingHistory => "booking-history", User, Rental, "My Bookings";
    BookingDetail => "booking-detail", User, Rental, "Booking";
    BecomeProvider => "become-provider", User, Rental, "Become a Provider";
    ProviderDashboard => "provider-dashboard", User, Rental, "Provider Dashboard";

    // Networking
    NetworkingHome => "networking-home", User, Networking, "Networking";
    EventList => "event-list", User, Networking, "Events";
    EventDetail => "event-detail", User, Networking, "Event";
    Connections => "connections", User, Networking, "Connections";
    ConnectionRequests => "connection-requests", User, Networking, "Requests";
    CompanyProfile => "company-profile", User, Networking, "Company";
    JobBoard => "job-board", User, Networking, "Jobs";

    // Dating
    DatingHome => "dating-home", User, Dating, "Blind Date";
    DatingPreferences => "dating-preferences", User, Dating, "Preferences";
    MatchQueue => "match-queue", User, Dating, "Your Matches";
    MatchReveal => "match-reveal", User, Dating, "Match Reveal";
    DateSchedule => "date-schedule", User, Dating, "Schedule a Date";
    DateFeedback => "date-feedback", User, Dating, "How Did It Go?";
    DatingSafety => "dating-safety", User, Dating, "Safety Tips";

    // Shared
    /// Another member's profile, opened from rental, networking or dating
    UserProfile => "user-profile", User, Shared, "Profile";
    /// Report a member
    ReportUser => "report-user", User, Shared, "Report";
    /// Payment sheet for bookings, premium matches and top-ups
    Checkout => "checkout", User, Shared, "Checkout";

    // Admin
    /// Admin landing page (admin portal generic default)
    AdminDashboard => "admin-dashboard", Admin, Admin, "Dashboard";
    AdminUsers => "admin-users", Admin, Admin, "Users";
    AdminUserDetail => "admin-user-detail", Admin, Admin, "User";
    AdminVerifications => "admin-verifications", Admin, Admin, "Verifications";
    AdminVerificationDetail => "admin-verification-detail", Admin, Admin, "Verification";
    AdminReports => "admin-reports", Admin, Admin, "Reports";
    AdminReportDetail => "admin-report-detail", Admin, Admin, "Report";
    AdminBookings => "admin-bookings", Admin, Admin, "Bookings";
    AdminPayouts => "admin-payouts", Admin, Admin, "Payouts";
    AdminEvents => "admin-events", Admin, Admin, "Events";
    AdminSettings => "admin-settings", Admin, Admin, "Platform Settings";
    AdminAuditLog => "admin-audit-log", Admin, Admin, "Audit Log";
}

impl Screen {
    /// Owning portal
    pub fn portal(self) -> Portal {
        self.spec().portal
    }

    /// Owning flow
    pub fn flow(self) -> Flow {
        self.spec().flow
    }

    /// Display title
    pub fn title(self) -> &'static str {
        self.spec().title
    }

    /// Flows that may lead into this screen when it is shared.
    ///
    /// Empty for every screen that is not shared.
    pub fn shared_origins(self) -> &'static [Flow] {
        match self {
            Screen::UserProfile => &[Flow::Rental, Flow::Networking, Flow::Dating],
            Screen::ReportUser => &[Flow::Main, Flow::Rental, Flow::Networking, Flow::Dating],
            Screen::Checkout => &[Flow::Main, Flow::Rental, Flow::Dating],
            _ => &[],
        }
    }

    /// Check if this screen is reachable from more than one flow
    pub fn is_shared(self) -> bool {
        !self.shared_origins().is_empty()
    }

    /// Check if arriving here from `previous` should be remembered as this
    /// screen's return target.
    pub fn remembers_origin(self, previous: Screen) -> bool {
        self.shared_origins().contains(&previous.flow())
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}
