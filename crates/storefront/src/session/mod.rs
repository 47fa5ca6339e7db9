//! # Session
//!
//! The signed-in user and their bearer token. The session is restored from durable
//! storage at start, written through on login and profile changes, and torn down on
//! logout or when the backend rejects the token.
//!
//! Every change of user switches the active cart, so each user only ever sees their
//! own cart. Observers learn about sign-in, sign-out and expiry through a broadcast
//! channel of [`SessionEvent`]s.

use crate::api::{ApiError, AuthApi, Credentials, RemoteFailure};
use crate::cart::{CartIdentity, CartStore};
use crate::model::{AuthSession, LoginRequest, ProfileUpdate, RegisterRequest, User};
use crate::orders::Role;
use crate::storage::{SharedStorage, StorageKey};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

const EVENT_BUFFER: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn { user: User },
    LoggedOut,
    /// The backend rejected the credentials; the session has been cleared.
    Expired { message: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Please log in to continue.")]
    NotAuthenticated,
}

impl RemoteFailure for SessionError {
    fn api_error(&self) -> Option<&ApiError> {
        match self {
            SessionError::Api(e) => Some(e),
            SessionError::NotAuthenticated => None,
        }
    }
}

pub struct Session<A: AuthApi + ?Sized> {
    api: Arc<A>,
    storage: SharedStorage,
    credentials: Credentials,
    user: Option<User>,
    events: broadcast::Sender<SessionEvent>,
    last_error: Option<String>,
    field_errors: BTreeMap<String, String>,
}

impl<A: AuthApi + ?Sized> Session<A> {
    /// An empty session. Call [`Session::initialize`] to restore a stored one.
    pub fn new(api: Arc<A>, storage: SharedStorage, credentials: Credentials) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            api,
            storage,
            credentials,
            user: None,
            events,
            last_error: None,
            field_errors: BTreeMap::new(),
        }
    }

    /// Restores the stored token and profile and switches the cart to that user.
    ///
    /// A half-written or unreadable session is discarded and the cart stays with the
    /// guest. Returns whether a session was restored.
    pub fn initialize(&mut self, cart: &mut CartStore) -> bool {
        let token = self.read(&StorageKey::Token);
        let profile = self.read(&StorageKey::UserInfo);
        let restored = match (token, profile) {
            (Some(token), Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => Some(AuthSession { user, token }),
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable stored profile");
                    None
                }
            },
            (None, None) => None,
            _ => {
                warn!("Discarding incomplete stored session");
                None
            }
        };

        match restored {
            Some(session) => {
                info!(user_id = %session.user.id, "Session restored");
                self.credentials.set(Some(session.token));
                cart.set_identity(CartIdentity::User(session.user.id.clone()));
                self.user = Some(session.user);
                true
            }
            None => {
                self.forget();
                cart.set_identity(CartIdentity::Guest);
                false
            }
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some() && self.credentials.is_set()
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|user| {
            if user.is_admin {
                Role::Admin
            } else {
                Role::Customer
            }
        })
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn field_errors(&self) -> &BTreeMap<String, String> {
        &self.field_errors
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
        self.field_errors.clear();
    }

    /// Clears the message of one form field, e.g. when the user edits it.
    pub fn clear_field_error(&mut self, field: &str) {
        self.field_errors.remove(field);
    }

    pub async fn login(
        &mut self,
        request: LoginRequest,
        cart: &mut CartStore,
    ) -> Result<&User, SessionError> {
        let api = Arc::clone(&self.api);
        let session = self.settle(api.login(request).await)?;
        Ok(self.establish(session, cart))
    }

    pub async fn register(
        &mut self,
        request: RegisterRequest,
        cart: &mut CartStore,
    ) -> Result<&User, SessionError> {
        let api = Arc::clone(&self.api);
        let session = self.settle(api.register(request).await)?;
        Ok(self.establish(session, cart))
    }

    pub fn logout(&mut self, cart: &mut CartStore) {
        if let Some(user) = &self.user {
            info!(user_id = %user.id, "Logged out");
        }
        self.end(cart);
        self.notify(SessionEvent::LoggedOut);
    }

    /// Ends the session after the backend rejected the token.
    pub fn expire(&mut self, message: impl Into<String>, cart: &mut CartStore) {
        let message = message.into();
        warn!(%message, "Session expired");
        self.end(cart);
        self.last_error = Some(message.clone());
        self.notify(SessionEvent::Expired { message });
    }

    /// Reloads the profile from the backend.
    pub async fn fetch_profile(&mut self) -> Result<&User, SessionError> {
        self.require_user()?;
        let api = Arc::clone(&self.api);
        let user = self.settle(api.profile().await)?;
        self.persist_user(&user);
        let user: &User = self.user.insert(user);
        Ok(user)
    }

    /// Saves profile changes. The backend answers with a reissued token, which
    /// replaces the stored one.
    pub async fn update_profile(&mut self, update: ProfileUpdate) -> Result<&User, SessionError> {
        self.require_user()?;
        let api = Arc::clone(&self.api);
        let session = self.settle(api.update_profile(update).await)?;
        self.store(&session);
        info!(user_id = %session.user.id, "Profile updated");
        let user: &User = self.user.insert(session.user);
        Ok(user)
    }

    fn require_user(&mut self) -> Result<(), SessionError> {
        if self.is_authenticated() {
            Ok(())
        } else {
            self.last_error = Some(SessionError::NotAuthenticated.to_string());
            Err(SessionError::NotAuthenticated)
        }
    }

    fn establish(&mut self, session: AuthSession, cart: &mut CartStore) -> &User {
        info!(user_id = %session.user.id, admin = session.user.is_admin, "Signed in");
        self.store(&session);
        cart.set_identity(CartIdentity::User(session.user.id.clone()));
        self.notify(SessionEvent::LoggedIn {
            user: session.user.clone(),
        });
        self.user.insert(session.user)
    }

    fn end(&mut self, cart: &mut CartStore) {
        self.forget();
        self.user = None;
        self.field_errors.clear();
        cart.set_identity(CartIdentity::Guest);
    }

    fn store(&mut self, session: &AuthSession) {
        self.credentials.set(Some(session.token.clone()));
        if let Err(e) = self.storage.write(&StorageKey::Token, &session.token) {
            warn!(error = %e, "Failed to persist token");
        }
        self.persist_user(&session.user);
    }

    fn persist_user(&self, user: &User) {
        let written = serde_json::to_string(user)
            .map_err(|e| e.to_string())
            .and_then(|raw| {
                self.storage
                    .write(&StorageKey::UserInfo, &raw)
                    .map_err(|e| e.to_string())
            });
        if let Err(error) = written {
            warn!(%error, "Failed to persist profile");
        }
    }

    fn forget(&mut self) {
        self.credentials.set(None);
        for key in [StorageKey::Token, StorageKey::UserInfo] {
            if let Err(e) = self.storage.remove(&key) {
                warn!(%key, error = %e, "Failed to remove session record");
            }
        }
    }

    fn read(&self, key: &StorageKey) -> Option<String> {
        match self.storage.read(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(%key, error = %e, "Failed to read session record");
                None
            }
        }
    }

    fn notify(&self, event: SessionEvent) {
        // No receivers is fine.
        let receivers = self.events.send(event).unwrap_or(0);
        debug!(receivers, "Session event sent");
    }

    fn settle<T>(&mut self, result: Result<T, ApiError>) -> Result<T, SessionError> {
        match result {
            Ok(value) => {
                self.clear_error();
                Ok(value)
            }
            Err(e) => {
                warn!(error = %e, kind = ?e.kind, "Session request failed");
                self.last_error = Some(e.message.clone());
                self.field_errors = e.field_errors.clone();
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiErrorKind;
    use crate::model::UserId;
    use crate::storage::{MemoryStorage, Storage};
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn ana() -> User {
        User {
            id: UserId::from(1),
            name: "Ana".into(),
            email: "ana@example.com".into(),
            is_admin: false,
        }
    }

    /// Accepts one password and counts issued tokens.
    struct FakeAuth {
        issued: Mutex<u32>,
    }

    impl FakeAuth {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                issued: Mutex::new(0),
            })
        }

        fn token(&self) -> String {
            let mut issued = self.issued.lock().unwrap();
            *issued += 1;
            format!("t{issued}")
        }
    }

    #[async_trait]
    impl AuthApi for FakeAuth {
        async fn login(&self, request: LoginRequest) -> Result<AuthSession, ApiError> {
            if request.password != "secret1" {
                return Err(ApiError::from_response(
                    401,
                    r#"{"message":"Invalid password"}"#,
                    true,
                ));
            }
            Ok(AuthSession {
                user: ana(),
                token: self.token(),
            })
        }

        async fn register(&self, _request: RegisterRequest) -> Result<AuthSession, ApiError> {
            Err(ApiError::from_response(
                400,
                r#"{"message":"User already exists","errors":{"email":"User already exists"}}"#,
                false,
            ))
        }

        async fn profile(&self) -> Result<User, ApiError> {
            Ok(ana())
        }

        async fn update_profile(&self, update: ProfileUpdate) -> Result<AuthSession, ApiError> {
            let mut user = ana();
            if let Some(name) = update.name {
                user.name = name;
            }
            Ok(AuthSession {
                user,
                token: self.token(),
            })
        }
    }

    fn parts() -> (Session<FakeAuth>, CartStore, SharedStorage, Credentials) {
        let storage: SharedStorage = Arc::new(MemoryStorage::new());
        let credentials = Credentials::new();
        let session = Session::new(FakeAuth::new(), storage.clone(), credentials.clone());
        let cart = CartStore::new(storage.clone());
        (session, cart, storage, credentials)
    }

    fn login_request(password: &str) -> LoginRequest {
        LoginRequest {
            email: "ana@example.com".into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn login_persists_and_switches_the_cart() {
        let (mut session, mut cart, storage, credentials) = parts();
        let mut events = session.subscribe();

        session.login(login_request("secret1"), &mut cart).await.unwrap();

        assert_eq!(cart.identity(), &CartIdentity::User(UserId::from(1)));
        assert_eq!(credentials.bearer().as_deref(), Some("t1"));
        assert_eq!(storage.read(&StorageKey::Token).unwrap().as_deref(), Some("t1"));
        assert!(matches!(events.recv().await.unwrap(), SessionEvent::LoggedIn { .. }));
        assert_eq!(session.role(), Some(Role::Customer));
    }

    #[tokio::test]
    async fn failed_login_exposes_the_field_hint() {
        let (mut session, mut cart, _, credentials) = parts();

        let err = session
            .login(login_request("wrong"), &mut cart)
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::Api(ref e) if e.kind == ApiErrorKind::Unauthorized));
        assert_eq!(session.last_error(), Some("Email or password is incorrect."));
        assert!(session.field_errors().contains_key("password"));
        assert!(!credentials.is_set());
        assert_eq!(cart.identity(), &CartIdentity::Guest);

        session.clear_field_error("password");
        assert!(session.field_errors().is_empty());
    }

    #[tokio::test]
    async fn register_surfaces_object_form_field_errors() {
        let (mut session, mut cart, _, _) = parts();
        let request = RegisterRequest {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            password: "secret1".into(),
        };

        assert!(session.register(request, &mut cart).await.is_err());
        assert_eq!(
            session.field_errors().get("email").map(String::as_str),
            Some("User already exists")
        );
    }

    #[tokio::test]
    async fn restored_session_survives_a_restart() {
        let (mut session, mut cart, storage, _) = parts();
        session.login(login_request("secret1"), &mut cart).await.unwrap();

        let credentials = Credentials::new();
        let mut restarted = Session::new(FakeAuth::new(), storage.clone(), credentials.clone());
        let mut cart = CartStore::new(storage);

        assert!(restarted.initialize(&mut cart));
        assert_eq!(restarted.user(), Some(&ana()));
        assert_eq!(credentials.bearer().as_deref(), Some("t1"));
        assert_eq!(cart.identity(), &CartIdentity::User(UserId::from(1)));
    }

    #[test]
    fn incomplete_stored_session_is_discarded() {
        let (mut session, mut cart, storage, _) = parts();
        storage.write(&StorageKey::Token, "orphan").unwrap();

        assert!(!session.initialize(&mut cart));
        assert_eq!(storage.read(&StorageKey::Token).unwrap(), None);
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn expiry_clears_everything_and_notifies() {
        let (mut session, mut cart, storage, credentials) = parts();
        session.login(login_request("secret1"), &mut cart).await.unwrap();
        let mut events = session.subscribe();

        session.expire("Please log in to continue.", &mut cart);

        assert!(!session.is_authenticated());
        assert!(!credentials.is_set());
        assert_eq!(storage.read(&StorageKey::UserInfo).unwrap(), None);
        assert_eq!(cart.identity(), &CartIdentity::Guest);
        assert_eq!(
            events.recv().await.unwrap(),
            SessionEvent::Expired {
                message: "Please log in to continue.".into()
            }
        );
    }

    #[tokio::test]
    async fn profile_update_replaces_the_token() {
        let (mut session, mut cart, storage, credentials) = parts();
        session.login(login_request("secret1"), &mut cart).await.unwrap();

        let update = ProfileUpdate {
            name: Some("Ana B".into()),
            ..ProfileUpdate::default()
        };
        let user = session.update_profile(update).await.unwrap();

        assert_eq!(user.name, "Ana B");
        assert_eq!(credentials.bearer().as_deref(), Some("t2"));
        assert_eq!(storage.read(&StorageKey::Token).unwrap().as_deref(), Some("t2"));
    }

    #[tokio::test]
    async fn profile_calls_need_a_session() {
        let (mut session, _, _, _) = parts();
        assert_eq!(
            session.fetch_profile().await.unwrap_err(),
            SessionError::NotAuthenticated
        );
    }
}
