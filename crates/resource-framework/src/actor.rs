//! # Generic Resource Actor
//!
//! `ResourceActor<T>` owns the store for one entity type and processes requests one at a
//! time on its own Tokio task, so the store needs no lock.
//!
//! ## Operations
//!
//! * **Create**: allocate the next sequence number, build the entity with
//!   `from_create_params`, run `on_create`, store it, reply with the stored entity.
//! * **Get**: look up, check `authorize_read`, reply with a clone.
//! * **List**: reply with every entity whose `matches` accepts the query, in creation
//!   order.
//! * **Update / Action**: run the hook on a clone; commit the clone only on success.
//! * **Delete**: run `on_delete`; remove only if it succeeds.

use crate::client::ResourceClient;
use crate::entity::ResourceEntity;
use crate::error::FrameworkError;
use crate::message::ResourceRequest;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

struct Slot<T> {
    seq: u32,
    entity: T,
}

/// The generic actor that manages a collection of entities.
///
/// # Usage
///
/// ```rust
/// use resource_framework::{ResourceActor, ResourceEntity};
/// use async_trait::async_trait;
///
/// #[derive(Clone, Debug)]
/// struct Note { id: u32, text: String }
/// #[derive(Debug, thiserror::Error)] #[error("note error")] struct NoteError;
///
/// #[async_trait]
/// impl ResourceEntity for Note {
///     type Id = u32;
///     type Create = String;
///     type Update = String;
///     type Action = ();
///     type ActionResult = ();
///     type Query = ();
///     type Principal = ();
///     type Context = ();
///     type Error = NoteError;
///
///     fn from_create_params(id: u32, text: String, _: &()) -> Result<Self, NoteError> {
///         Ok(Self { id, text })
///     }
///     fn matches(&self, _: &(), _: &()) -> bool { true }
///     async fn on_update(&mut self, text: String, _: &(), _: &()) -> Result<(), NoteError> {
///         self.text = text;
///         Ok(())
///     }
///     async fn handle_action(&mut self, _: (), _: &(), _: &()) -> Result<(), NoteError> { Ok(()) }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let (actor, client) = ResourceActor::<Note>::new(8);
///     tokio::spawn(actor.run(()));
///     let note = client.create("hello".to_string(), ()).await.unwrap();
///     assert_eq!(note.text, "hello");
/// }
/// ```
pub struct ResourceActor<T: ResourceEntity> {
    receiver: mpsc::Receiver<ResourceRequest<T>>,
    store: HashMap<T::Id, Slot<T>>,
    next_id: u32,
}

impl<T: ResourceEntity> ResourceActor<T> {
    /// Creates the actor and the client connected to it.
    ///
    /// `buffer_size` bounds the request queue; senders wait when it is full.
    pub fn new(buffer_size: usize) -> (Self, ResourceClient<T>) {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let actor = Self {
            receiver,
            store: HashMap::new(),
            next_id: 1,
        };
        (actor, ResourceClient::new(sender))
    }

    /// Runs the event loop until every client has been dropped.
    ///
    /// `context` is handed to every hook; it usually holds clients of other actors that
    /// were created after this one.
    pub async fn run(mut self, context: T::Context) {
        let entity_type = std::any::type_name::<T>()
            .split("::")
            .last()
            .unwrap_or("Unknown");
        info!(entity_type, "Actor started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ResourceRequest::Create {
                    params,
                    principal,
                    respond_to,
                } => {
                    debug!(entity_type, ?params, ?principal, "Create");
                    let seq = self.next_id;
                    let id = T::Id::from(seq);

                    let mut item = match T::from_create_params(id.clone(), params, &principal) {
                        Ok(item) => item,
                        Err(e) => {
                            warn!(entity_type, error = %e, "Create rejected");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                            continue;
                        }
                    };
                    if let Err(e) = item.on_create(&principal, &context).await {
                        warn!(entity_type, error = %e, "on_create failed");
                        let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        continue;
                    }
                    self.next_id += 1;
                    self.store.insert(
                        id.clone(),
                        Slot {
                            seq,
                            entity: item.clone(),
                        },
                    );
                    info!(entity_type, %id, size = self.store.len(), "Created");
                    let _ = respond_to.send(Ok(item));
                }
                ResourceRequest::Get {
                    id,
                    principal,
                    respond_to,
                } => {
                    let reply = match self.store.get(&id) {
                        Some(slot) => match slot.entity.authorize_read(&principal) {
                            Ok(()) => Ok(Some(slot.entity.clone())),
                            Err(e) => {
                                warn!(entity_type, %id, error = %e, "Read denied");
                                Err(FrameworkError::EntityError(Box::new(e)))
                            }
                        },
                        None => Ok(None),
                    };
                    debug!(entity_type, %id, found = matches!(reply, Ok(Some(_))), "Get");
                    let _ = respond_to.send(reply);
                }
                ResourceRequest::List {
                    query,
                    principal,
                    respond_to,
                } => {
                    let mut hits: Vec<&Slot<T>> = self
                        .store
                        .values()
                        .filter(|slot| slot.entity.matches(&query, &principal))
                        .collect();
                    hits.sort_by_key(|slot| slot.seq);
                    let items: Vec<T> = hits.into_iter().map(|slot| slot.entity.clone()).collect();
                    debug!(entity_type, ?query, hits = items.len(), "List");
                    let _ = respond_to.send(Ok(items));
                }
                ResourceRequest::Update {
                    id,
                    update,
                    principal,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?update, "Update");
                    let Some(slot) = self.store.get_mut(&id) else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                        continue;
                    };
                    let mut draft = slot.entity.clone();
                    match draft.on_update(update, &principal, &context).await {
                        Ok(()) => {
                            slot.entity = draft.clone();
                            info!(entity_type, %id, "Updated");
                            let _ = respond_to.send(Ok(draft));
                        }
                        Err(e) => {
                            warn!(entity_type, %id, error = %e, "Update failed");
                            let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        }
                    }
                }
                ResourceRequest::Delete {
                    id,
                    principal,
                    respond_to,
                } => {
                    debug!(entity_type, %id, "Delete");
                    let Some(slot) = self.store.get(&id) else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                        continue;
                    };
                    if let Err(e) = slot.entity.on_delete(&principal, &context).await {
                        warn!(entity_type, %id, error = %e, "on_delete failed");
                        let _ = respond_to.send(Err(FrameworkError::EntityError(Box::new(e))));
                        continue;
                    }
                    self.store.remove(&id);
                    info!(entity_type, %id, size = self.store.len(), "Deleted");
                    let _ = respond_to.send(Ok(()));
                }
                ResourceRequest::Action {
                    id,
                    action,
                    principal,
                    respond_to,
                } => {
                    debug!(entity_type, %id, ?action, "Action");
                    let Some(slot) = self.store.get_mut(&id) else {
                        warn!(entity_type, %id, "Not found");
                        let _ = respond_to.send(Err(FrameworkError::NotFound(id.to_string())));
                        continue;
                    };
                    let mut draft = slot.entity.clone();
                    let result = match draft.handle_action(action, &principal, &context).await {
                        Ok(result) => {
                            slot.entity = draft;
                            info!(entity_type, %id, "Action ok");
                            Ok(result)
                        }
                        Err(e) => {
                            warn!(entity_type, %id, error = %e, "Action failed");
                            Err(FrameworkError::EntityError(Box::new(e)))
                        }
                    };
                    let _ = respond_to.send(result);
                }
            }
        }

        info!(entity_type, size = self.store.len(), "Shutdown");
    }
}
