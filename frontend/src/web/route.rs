//! Application routes and their guard rules. No DOM access here.

use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppRoute {
    #[default]
    Login,
    Signup,
    /// Requires a session.
    Dashboard,
    NotFound,
}

impl AppRoute {
    pub fn from_path(path: &str) -> Self {
        match path.trim_end_matches('/') {
            "" | "/login" => Self::Login,
            "/signup" => Self::Signup,
            "/dashboard" => Self::Dashboard,
            _ => Self::NotFound,
        }
    }

    pub fn to_path(&self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Signup => "/signup",
            Self::Dashboard => "/dashboard",
            Self::NotFound => "/404",
        }
    }

    pub fn requires_auth(&self) -> bool {
        matches!(self, Self::Dashboard)
    }

    /// Login and signup make no sense with a live session.
    pub fn should_redirect_when_authenticated(&self) -> bool {
        matches!(self, Self::Login | Self::Signup)
    }

    pub fn auth_failure_redirect() -> Self {
        Self::Login
    }

    pub fn auth_success_redirect() -> Self {
        Self::Dashboard
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_resolve() {
        assert_eq!(AppRoute::from_path("/"), AppRoute::Login);
        assert_eq!(AppRoute::from_path("/login"), AppRoute::Login);
        assert_eq!(AppRoute::from_path("/signup/"), AppRoute::Signup);
        assert_eq!(AppRoute::from_path("/dashboard"), AppRoute::Dashboard);
        assert_eq!(AppRoute::from_path("/admin"), AppRoute::NotFound);
    }

    #[test]
    fn only_dashboard_is_guarded() {
        assert!(AppRoute::Dashboard.requires_auth());
        assert!(!AppRoute::Signup.requires_auth());
        assert!(AppRoute::Signup.should_redirect_when_authenticated());
    }

    #[test]
    fn round_trip_through_path() {
        for route in [AppRoute::Login, AppRoute::Signup, AppRoute::Dashboard] {
            assert_eq!(AppRoute::from_path(route.to_path()), route);
        }
    }
}
