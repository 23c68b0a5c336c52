//! # Fallback Route Map
//!
//! Static "parent" screen used by `back()` when the history stack is empty,
//! for example after a deep link or once old history has been trimmed.
//!
//! The table is intentionally partial: root screens have no entry and `back()`
//! on them with no history is a no-op.

use crate::screen::{Portal, Screen};

/// Screens with no fallback parent.
pub const ROOT_SCREENS: &[Screen] = &[
    Screen::Splash,
    Screen::Welcome,
    Screen::Home,
    Screen::AdminDashboard,
];

/// `(screen, parent)` pairs.
pub const FALLBACK_ROUTES: &[(Screen, Screen)] = &[
    // Onboarding
    (Screen::SignIn, Screen::Welcome),
    (Screen::SignUp, Screen::Welcome),
    (Screen::ForgotPassword, Screen::SignIn),
    (Screen::OnboardingProfile, Screen::SignUp),
    (Screen::OnboardingInterests, Screen::OnboardingProfile),
    (Screen::OnboardingPhotos, Screen::OnboardingInterests),
    (Screen::OnboardingComplete, Screen::OnboardingPhotos),
    // Main
    (Screen::Search, Screen::Home),
    (Screen::Notifications, Screen::Home),
    (Screen::Inbox, Screen::Home),
    (Screen::Conversation, Screen::Inbox),
    (Screen::MyProfile, Screen::Home),
    (Screen::EditProfile, Screen::MyProfile),
    (Screen::Settings, Screen::MyProfile),
    (Screen::AccountSecurity, Screen::Settings),
    (Screen::Wallet, Screen::MyProfile),
    (Screen::TopUp, Screen::Wallet),
    (Screen::Help, Screen::Settings),
    (Screen::Terms, Screen::Settings),
    (Screen::PrivacyPolicy, Screen::Settings),
    // Verification
    (Screen::VerificationHub, Screen::MyProfile),
    (Screen::PhoneVerification, Screen::VerificationHub),
    (Screen::EmailVerification, Screen::VerificationHub),
    (Screen::AgeVerification, Screen::VerificationHub),
    (Screen::SelfieVerification, Screen::VerificationHub),
    (Screen::VerificationComplete, Screen::VerificationHub),
    // Rental
    (Screen::RentalHome, Screen::Home),
    (Screen::RentalCategory, Screen::RentalHome),
    (Screen::FriendList, Screen::RentalCategory),
    (Screen::ExpertList, Screen::RentalCategory),
    (Screen::BookingRequest, Screen::RentalHome),
    (Screen::BookingConfirm, Screen::BookingRequest),
    (Screen::BookingHistory, Screen::RentalHome),
    (Screen::BookingDetail, Screen::BookingHistory),
    (Screen::BecomeProvider, Screen::RentalHome),
    (Screen::ProviderDashboard, Screen::RentalHome),
    // Networking
    (Screen::NetworkingHome, Screen::Home),
    (Screen::EventList, Screen::NetworkingHome),
    (Screen::EventDetail, Screen::EventList),
    (Screen::Connections, Screen::NetworkingHome),
    (Screen::ConnectionRequests, Screen::Connections),
    (Screen::CompanyProfile, Screen::NetworkingHome),
    (Screen::JobBoard, Screen::NetworkingHome),
    // Dating
    (Screen::DatingHome, Screen::Home),
    (Screen::DatingPreferences, Screen::DatingHome),
    (Screen::MatchQueue, Screen::DatingHome),
    (Screen::MatchReveal, Screen::MatchQueue),
    (Screen::DateSchedule, Screen::MatchReveal),
    (Screen::DateFeedback, Screen::DatingHome),
    (Screen::DatingSafety, Screen::DatingHome),
    // Shared screens fall back to the generic default; context memory refines it
    (Screen::UserProfile, Screen::Home),
    (Screen::ReportUser, Screen::Home),
    (Screen::Checkout, Screen::Home),
    // Admin
    (Screen::AdminUsers, Screen::AdminDashboard),
    (Screen::AdminUserDetail, Screen::AdminUsers),
    (Screen::AdminVerifications, Screen::AdminDashboard),
    (Screen::AdminVerificationDetail, Screen::AdminVerifications),
    (Screen::AdminReports, Screen::AdminDashboard),
    (Screen::AdminReportDetail, Screen::AdminReports),
    (Screen::AdminBookings, Screen::AdminDashboard),
    (Screen::AdminPayouts, Screen::AdminDashboard),
    (Screen::AdminEvents, Screen::AdminDashboard),
    (Screen::AdminSettings, Screen::AdminDashboard),
    (Screen::AdminAuditLog, Screen::AdminDashboard),
];

/// Look up the fallback parent for a screen.
pub fn fallback_for(screen: Screen) -> Option<Screen> {
    FALLBACK_ROUTES
        .iter()
        .find(|(from, _)| *from == screen)
        .map(|(_, to)| *to)
}

/// Check if a screen is intentionally left without a fallback.
pub fn is_root(screen: Screen) -> bool {
    ROOT_SCREENS.contains(&screen)
}

/// Generic default parent for a portal.
pub fn generic_default(portal: Portal) -> Screen {
    portal.home()
}

/// Check if the fallback for `screen` is just its portal's generic default.
pub fn falls_back_to_generic(screen: Screen) -> bool {
    fallback_for(screen) == Some(generic_default(screen.portal()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_screen_is_root_or_routed_once() {
        for screen in Screen::all() {
            let entries = FALLBACK_ROUTES
                .iter()
                .filter(|(from, _)| from == screen)
                .count();
            if is_root(*screen) {
                assert_eq!(entries, 0, "root {screen} must not have a fallback");
            } else {
                assert_eq!(entries, 1, "{screen} needs exactly one fallback");
            }
        }
    }

    #[test]
    fn test_fallbacks_stay_in_portal() {
        for (from, to) in FALLBACK_ROUTES {
            assert_eq!(from.portal(), to.portal(), "{from} -> {to}");
            assert_ne!(from, to);
        }
    }

    #[test]
    fn test_fallback_chains_reach_a_root() {
        for screen in Screen::all() {
            let mut seen = HashSet::new();
            let mut cursor = *screen;
            while let Some(parent) = fallback_for(cursor) {
                assert!(seen.insert(cursor), "cycle through {cursor}");
                cursor = parent;
            }
            assert!(is_root(cursor), "{screen} ends at non-root {cursor}");
        }
    }

    #[test]
    fn test_shared_screens_use_generic_default() {
        for screen in Screen::all().iter().filter(|s| s.is_shared()) {
            assert!(falls_back_to_generic(*screen), "{screen}");
        }
        assert!(!falls_back_to_generic(Screen::BookingDetail));
    }

    #[test]
    fn test_root_lookup() {
        assert_eq!(fallback_for(Screen::Home), None);
        assert_eq!(fallback_for(Screen::ExpertList), Some(Screen::RentalCategory));
        assert_eq!(generic_default(Portal::Admin), Screen::AdminDashboard);
    }
}
