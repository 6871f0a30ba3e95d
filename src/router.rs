//! Route table and navigation guard.

use std::fmt;
use std::sync::Arc;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::store::SessionStore;

/// Characters escaped in a path segment
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    /// Home list
    Dashboard,
    HomeDetails { home_id: String },
    RoomDetails { room_id: String },
}

impl Route {
    /// Match a path against the route table. Query strings, fragments and
    /// one trailing slash are ignored; ids are percent-decoded. Returns
    /// `None` for paths the table does not know.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(|c: char| c == '?' || c == '#').next().unwrap_or_default();
        let path = match path.strip_suffix('/') {
            Some(trimmed) if !trimmed.is_empty() => trimmed,
            _ => path,
        };
        let segments: Vec<&str> = path.strip_prefix('/')?.split('/').collect();

        match segments.as_slice() {
            [""] => Some(Route::Dashboard),
            ["login"] => Some(Route::Login),
            ["homes", id] if !id.is_empty() => Some(Route::HomeDetails { home_id: decode(id) }),
            ["rooms", id] if !id.is_empty() => Some(Route::RoomDetails { room_id: decode(id) }),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Route::Login => "login",
            Route::Dashboard => "home",
            Route::HomeDetails { .. } => "home-details",
            Route::RoomDetails { .. } => "room-details",
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Dashboard => "/".to_string(),
            Route::HomeDetails { home_id } => format!("/homes/{}", utf8_percent_encode(home_id, SEGMENT)),
            Route::RoomDetails { room_id } => format!("/rooms/{}", utf8_percent_encode(room_id, SEGMENT)),
        }
    }

    /// Every route except the login page needs a signed-in identity
    pub fn requires_auth(&self) -> bool {
        !matches!(self, Route::Login)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

fn decode(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

/// Outcome of a guarded navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Allow(Route),
    Redirect(Route),
}

impl Navigation {
    /// Route the user ends up on
    pub fn route(&self) -> &Route {
        match self {
            Navigation::Allow(route) | Navigation::Redirect(route) => route,
        }
    }
}

/// Gates navigation on the session. Waits for the session to become ready
/// before deciding.
#[derive(Clone)]
pub struct RouteGuard {
    session: Arc<SessionStore>,
}

impl RouteGuard {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }

    pub async fn before_each(&self, to: &Route) -> Navigation {
        self.session.wait_ready().await;
        let authed = self.session.is_authed();

        if to.requires_auth() && !authed {
            log::debug!("Redirecting {} to login", to);
            return Navigation::Redirect(Route::Login);
        }
        if *to == Route::Login && authed {
            return Navigation::Redirect(Route::Dashboard);
        }
        Navigation::Allow(to.clone())
    }

    /// Resolve a raw path; unknown paths redirect to the home list, which
    /// is itself guarded.
    pub async fn navigate(&self, path: &str) -> Navigation {
        match Route::parse(path) {
            Some(route) => self.before_each(&route).await,
            None => Navigation::Redirect(self.before_each(&Route::Dashboard).await.route().clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Identity;
    use crate::repository::MemoryIdentityProvider;
    use crate::test_support::{session_for, signed_out_session};

    #[test]
    fn test_parse_route_table() {
        assert_eq!(Route::parse("/"), Some(Route::Dashboard));
        assert_eq!(Route::parse("/login"), Some(Route::Login));
        assert_eq!(Route::parse("/login/"), Some(Route::Login));
        assert_eq!(
            Route::parse("/homes/abc?tab=rooms"),
            Some(Route::HomeDetails { home_id: "abc".into() })
        );
        assert_eq!(
            Route::parse("/rooms/a%20b#top"),
            Some(Route::RoomDetails { room_id: "a b".into() })
        );
        assert_eq!(Route::parse("/homes/"), None);
        assert_eq!(Route::parse("/homes/a/b"), None);
        assert_eq!(Route::parse("/settings"), None);
        assert_eq!(Route::parse("relative"), None);
    }

    #[test]
    fn test_path_round_trips_ids() {
        let route = Route::HomeDetails { home_id: "a b/c".into() };
        assert_eq!(route.path(), "/homes/a%20b%2Fc");
        assert_eq!(Route::parse(&route.path()), Some(route));
    }

    #[tokio::test]
    async fn test_protected_route_redirects_when_signed_out() {
        let guard = RouteGuard::new(signed_out_session().await);
        let nav = guard.navigate("/homes/abc").await;
        assert_eq!(nav, Navigation::Redirect(Route::Login));
    }

    #[tokio::test]
    async fn test_login_redirects_when_signed_in() {
        let guard = RouteGuard::new(session_for("u1").await);
        assert_eq!(guard.navigate("/login").await, Navigation::Redirect(Route::Dashboard));
        assert_eq!(
            guard.navigate("/rooms/r1").await,
            Navigation::Allow(Route::RoomDetails { room_id: "r1".into() })
        );
    }

    #[tokio::test]
    async fn test_unknown_path_goes_home_or_login() {
        let signed_in = RouteGuard::new(session_for("u1").await);
        assert_eq!(signed_in.navigate("/nope").await, Navigation::Redirect(Route::Dashboard));

        let signed_out = RouteGuard::new(signed_out_session().await);
        assert_eq!(signed_out.navigate("/nope").await, Navigation::Redirect(Route::Login));
        assert_eq!(signed_out.navigate("/login").await, Navigation::Allow(Route::Login));
    }

    #[tokio::test]
    async fn test_guard_waits_for_session_ready() {
        let provider = MemoryIdentityProvider::signed_in(Identity::new("u1"));
        let session = Arc::new(SessionStore::new(Arc::new(provider)));
        let guard = RouteGuard::new(session.clone());

        let pending = tokio::spawn({
            let guard = guard.clone();
            async move { guard.navigate("/").await }
        });
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        session.init();
        assert_eq!(pending.await.unwrap(), Navigation::Allow(Route::Dashboard));
    }
}
