//! # Mock Clients
//!
//! [`MockClient<T>`] hands out a real [`ResourceClient<T>`] whose requests are answered
//! from a queue of scripted expectations instead of a running actor. Use it to test code
//! that sits *around* a client (orchestration, error mapping) without any entity state.
//!
//! | | MockClient | ResourceActor |
//! |---|---|---|
//! | State | scripted replies | real store |
//! | Error injection | `return_err` | needs a matching entity state |
//! | Use case | logic around the client | the entity hooks themselves |
//!
//! A request that does not match the next expectation (wrong kind or wrong id) is
//! answered with `FrameworkError::ActorDropped` and recorded; [`MockClient::verify`]
//! panics on recorded mismatches as well as on leftover expectations.
//!
//! ```rust
//! use resource_framework::mock::MockClient;
//! use resource_framework::ResourceEntity;
//! use async_trait::async_trait;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Coupon { id: u32, code: String }
//! #[derive(Debug, thiserror::Error)] #[error("coupon error")] struct CouponError;
//!
//! #[async_trait]
//! impl ResourceEntity for Coupon {
//!     type Id = u32; type Create = String; type Update = (); type Action = ();
//!     type ActionResult = (); type Query = (); type Principal = (); type Context = ();
//!     type Error = CouponError;
//!     fn from_create_params(id: u32, code: String, _: &()) -> Result<Self, CouponError> {
//!         Ok(Self { id, code })
//!     }
//!     fn matches(&self, _: &(), _: &()) -> bool { true }
//!     async fn on_update(&mut self, _: (), _: &(), _: &()) -> Result<(), CouponError> { Ok(()) }
//!     async fn handle_action(&mut self, _: (), _: &(), _: &()) -> Result<(), CouponError> {
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut mock = MockClient::<Coupon>::new();
//!     mock.expect_get(7).return_ok(Some(Coupon { id: 7, code: "SPRING".into() }));
//!
//!     let client = mock.client();
//!     let coupon = client.get(7, ()).await.unwrap().unwrap();
//!     assert_eq!(coupon.code, "SPRING");
//!     mock.verify();
//! }
//! ```

use crate::client::ResourceClient;
use crate::entity::ResourceEntity;
use crate::error::FrameworkError;
use crate::message::ResourceRequest;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, oneshot};

enum Expectation<T: ResourceEntity> {
    Get {
        id: T::Id,
        response: Result<Option<T>, FrameworkError>,
    },
    Create {
        response: Result<T, FrameworkError>,
    },
    List {
        response: Result<Vec<T>, FrameworkError>,
    },
    Update {
        id: T::Id,
        response: Result<T, FrameworkError>,
    },
    Delete {
        id: T::Id,
        response: Result<(), FrameworkError>,
    },
    Action {
        id: T::Id,
        response: Result<T::ActionResult, FrameworkError>,
    },
}

impl<T: ResourceEntity> Expectation<T> {
    fn kind(&self) -> &'static str {
        match self {
            Expectation::Get { .. } => "Get",
            Expectation::Create { .. } => "Create",
            Expectation::List { .. } => "List",
            Expectation::Update { .. } => "Update",
            Expectation::Delete { .. } => "Delete",
            Expectation::Action { .. } => "Action",
        }
    }
}

type Queue<T> = Arc<Mutex<VecDeque<Expectation<T>>>>;

fn lock<V>(m: &Mutex<V>) -> MutexGuard<'_, V> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A client backed by scripted replies.
///
/// Expectations are consumed in the order they were registered.
pub struct MockClient<T: ResourceEntity> {
    client: ResourceClient<T>,
    expectations: Queue<T>,
    mismatches: Arc<Mutex<Vec<String>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: ResourceEntity> Default for MockClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ResourceEntity> MockClient<T> {
    /// Creates a mock with no expectations. Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        let (sender, mut receiver) = mpsc::channel::<ResourceRequest<T>>(100);
        let expectations: Queue<T> = Arc::new(Mutex::new(VecDeque::new()));
        let mismatches = Arc::new(Mutex::new(Vec::new()));
        let queue = expectations.clone();
        let failures = mismatches.clone();

        let handle = tokio::spawn(async move {
            while let Some(request) = receiver.recv().await {
                let next = lock(&queue).pop_front();
                if let Err(reason) = answer(request, next) {
                    tracing::warn!(%reason, "Mock expectation mismatch");
                    lock(&failures).push(reason);
                }
            }
        });

        Self {
            client: ResourceClient::new(sender),
            expectations,
            mismatches,
            _handle: handle,
        }
    }

    /// Returns a client wired to this mock.
    pub fn client(&self) -> ResourceClient<T> {
        self.client.clone()
    }

    pub fn expect_get(&mut self, id: T::Id) -> ExpectationBuilder<T, Option<T>> {
        self.builder(move |response| Expectation::Get { id, response })
    }

    pub fn expect_create(&mut self) -> ExpectationBuilder<T, T> {
        self.builder(|response| Expectation::Create { response })
    }

    pub fn expect_list(&mut self) -> ExpectationBuilder<T, Vec<T>> {
        self.builder(|response| Expectation::List { response })
    }

    pub fn expect_update(&mut self, id: T::Id) -> ExpectationBuilder<T, T> {
        self.builder(move |response| Expectation::Update { id, response })
    }

    pub fn expect_delete(&mut self, id: T::Id) -> ExpectationBuilder<T, ()> {
        self.builder(move |response| Expectation::Delete { id, response })
    }

    pub fn expect_action(&mut self, id: T::Id) -> ExpectationBuilder<T, T::ActionResult> {
        self.builder(move |response| Expectation::Action { id, response })
    }

    fn builder<R: 'static>(
        &mut self,
        make: impl FnOnce(Result<R, FrameworkError>) -> Expectation<T> + Send + 'static,
    ) -> ExpectationBuilder<T, R> {
        ExpectationBuilder {
            make: Box::new(make),
            expectations: self.expectations.clone(),
        }
    }

    /// Panics if a request did not match its expectation or an expectation was never used.
    pub fn verify(&self) {
        let mismatches = lock(&self.mismatches);
        if !mismatches.is_empty() {
            panic!("Mock received unexpected requests: {:?}", *mismatches);
        }
        let remaining = lock(&self.expectations);
        if !remaining.is_empty() {
            let kinds: Vec<_> = remaining.iter().map(Expectation::kind).collect();
            panic!("Not all expectations were met. Remaining: {kinds:?}");
        }
    }
}

/// Finishes an expectation with the reply the mock should send.
pub struct ExpectationBuilder<T: ResourceEntity, R> {
    make: Box<dyn FnOnce(Result<R, FrameworkError>) -> Expectation<T> + Send>,
    expectations: Queue<T>,
}

impl<T: ResourceEntity, R> ExpectationBuilder<T, R> {
    pub fn return_ok(self, value: R) {
        lock(&self.expectations).push_back((self.make)(Ok(value)));
    }

    pub fn return_err(self, error: FrameworkError) {
        lock(&self.expectations).push_back((self.make)(Err(error)));
    }
}

fn reply<R>(
    respond_to: oneshot::Sender<Result<R, FrameworkError>>,
    response: Result<R, FrameworkError>,
) {
    let _ = respond_to.send(response);
}

fn check_id<T: ResourceEntity>(got: &T::Id, want: &T::Id) -> Result<(), String> {
    if got == want {
        Ok(())
    } else {
        Err(format!("expected id {want}, got {got}"))
    }
}

// Dropping `respond_to` on a mismatch makes the caller see `ActorDropped`.
fn answer<T: ResourceEntity>(
    request: ResourceRequest<T>,
    expectation: Option<Expectation<T>>,
) -> Result<(), String> {
    let Some(expectation) = expectation else {
        return Err(format!("unexpected {} request", request.kind()));
    };
    match (request, expectation) {
        (ResourceRequest::Get { id, respond_to, .. }, Expectation::Get { id: want, response }) => {
            check_id::<T>(&id, &want)?;
            reply(respond_to, response);
        }
        (ResourceRequest::Create { respond_to, .. }, Expectation::Create { response }) => {
            reply(respond_to, response);
        }
        (ResourceRequest::List { respond_to, .. }, Expectation::List { response }) => {
            reply(respond_to, response);
        }
        (
            ResourceRequest::Update { id, respond_to, .. },
            Expectation::Update { id: want, response },
        ) => {
            check_id::<T>(&id, &want)?;
            reply(respond_to, response);
        }
        (
            ResourceRequest::Delete { id, respond_to, .. },
            Expectation::Delete { id: want, response },
        ) => {
            check_id::<T>(&id, &want)?;
            reply(respond_to, response);
        }
        (
            ResourceRequest::Action { id, respond_to, .. },
            Expectation::Action { id: want, response },
        ) => {
            check_id::<T>(&id, &want)?;
            reply(respond_to, response);
        }
        (request, expectation) => {
            return Err(format!(
                "expected {} request, got {}",
                expectation.kind(),
                request.kind()
            ));
        }
    }
    Ok(())
}

/// Creates a client plus the raw receiving end, for tests that answer requests by hand.
pub fn create_mock_client<T: ResourceEntity>(
    buffer_size: usize,
) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Waits for the next request and returns it if it is a `Create`.
pub async fn expect_create<T: ResourceEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Create, T::Principal, oneshot::Sender<Result<T, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create {
            params,
            principal,
            respond_to,
        }) => Some((params, principal, respond_to)),
        _ => None,
    }
}

/// Waits for the next request and returns it if it is a `Get`.
pub async fn expect_get<T: ResourceEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, oneshot::Sender<Result<Option<T>, FrameworkError>>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to, .. }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Waits for the next request and returns it if it is an `Action`.
pub async fn expect_action<T: ResourceEntity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(
    T::Id,
    T::Action,
    oneshot::Sender<Result<T::ActionResult, FrameworkError>>,
)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action {
            id,
            action,
            respond_to,
            ..
        }) => Some((id, action, respond_to)),
        _ => None,
    }
}
