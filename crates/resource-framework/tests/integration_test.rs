use async_trait::async_trait;
use resource_framework::{FrameworkError, ResourceActor, ResourceEntity};

// --- Test entity: a shelf with a bounded number of slots ---

#[derive(Clone, Debug, PartialEq)]
struct Shelf {
    id: u32,
    label: String,
    owner: String,
    used: u32,
    capacity: u32,
}

#[derive(Debug)]
struct ShelfCreate {
    label: String,
    capacity: u32,
}

#[derive(Debug)]
enum ShelfAction {
    Put(u32),
    Take(u32),
}

#[derive(Debug)]
enum ShelfQuery {
    All,
    Labelled(String),
}

#[derive(Debug, thiserror::Error, PartialEq)]
enum ShelfError {
    #[error("capacity must be positive")]
    ZeroCapacity,
    #[error("shelf is full")]
    Full,
    #[error("not enough items")]
    Short,
    #[error("shelf is not empty")]
    NotEmpty,
    #[error("not your shelf")]
    Forbidden,
}

#[async_trait]
impl ResourceEntity for Shelf {
    type Id = u32;
    type Create = ShelfCreate;
    type Update = String;
    type Action = ShelfAction;
    type ActionResult = u32;
    type Query = ShelfQuery;
    type Principal = String;
    type Context = ();
    type Error = ShelfError;

    fn from_create_params(id: u32, params: ShelfCreate, who: &String) -> Result<Self, ShelfError> {
        if params.capacity == 0 {
            return Err(ShelfError::ZeroCapacity);
        }
        Ok(Self {
            id,
            label: params.label,
            owner: who.clone(),
            used: 0,
            capacity: params.capacity,
        })
    }

    fn authorize_read(&self, who: &String) -> Result<(), ShelfError> {
        if &self.owner == who || who == "admin" {
            Ok(())
        } else {
            Err(ShelfError::Forbidden)
        }
    }

    fn matches(&self, query: &ShelfQuery, _who: &String) -> bool {
        match query {
            ShelfQuery::All => true,
            ShelfQuery::Labelled(label) => &self.label == label,
        }
    }

    async fn on_update(&mut self, label: String, _: &String, _: &()) -> Result<(), ShelfError> {
        self.label = label;
        Ok(())
    }

    async fn on_delete(&self, _: &String, _: &()) -> Result<(), ShelfError> {
        if self.used > 0 {
            return Err(ShelfError::NotEmpty);
        }
        Ok(())
    }

    async fn handle_action(
        &mut self,
        action: ShelfAction,
        _: &String,
        _: &(),
    ) -> Result<u32, ShelfError> {
        match action {
            ShelfAction::Put(n) => {
                // Partial mutation before the check: must not leak into the store.
                self.used += n;
                if self.used > self.capacity {
                    return Err(ShelfError::Full);
                }
            }
            ShelfAction::Take(n) => {
                self.used = self.used.checked_sub(n).ok_or(ShelfError::Short)?;
            }
        }
        Ok(self.used)
    }
}

fn shelf(label: &str, capacity: u32) -> ShelfCreate {
    ShelfCreate {
        label: label.into(),
        capacity,
    }
}

fn who(name: &str) -> String {
    name.to_string()
}

#[tokio::test]
async fn full_lifecycle() {
    let (actor, client) = ResourceActor::<Shelf>::new(10);
    tokio::spawn(actor.run(()));

    let created = client.create(shelf("books", 3), who("ana")).await.unwrap();
    assert_eq!(created.id, 1);
    assert_eq!(created.owner, "ana");

    assert_eq!(
        client
            .perform_action(1, ShelfAction::Put(2), who("ana"))
            .await
            .unwrap(),
        2
    );

    let renamed = client.update(1, "novels".into(), who("ana")).await.unwrap();
    assert_eq!(renamed.label, "novels");
    assert_eq!(renamed.used, 2);

    // Non-empty shelves refuse deletion.
    let err = client.delete(1, who("ana")).await.unwrap_err();
    assert_eq!(err.entity_error::<ShelfError>(), Some(&ShelfError::NotEmpty));

    client
        .perform_action(1, ShelfAction::Take(2), who("ana"))
        .await
        .unwrap();
    client.delete(1, who("ana")).await.unwrap();
    assert!(client.get(1, who("ana")).await.unwrap().is_none());
}

#[tokio::test]
async fn failed_action_leaves_entity_untouched() {
    let (actor, client) = ResourceActor::<Shelf>::new(10);
    tokio::spawn(actor.run(()));

    client.create(shelf("tools", 2), who("ana")).await.unwrap();
    let err = client
        .perform_action(1, ShelfAction::Put(5), who("ana"))
        .await
        .unwrap_err();
    assert_eq!(err.entity_error::<ShelfError>(), Some(&ShelfError::Full));

    let stored = client.get(1, who("ana")).await.unwrap().unwrap();
    assert_eq!(stored.used, 0);
}

#[tokio::test]
async fn rejected_create_does_not_consume_an_id() {
    let (actor, client) = ResourceActor::<Shelf>::new(10);
    tokio::spawn(actor.run(()));

    let err = client.create(shelf("void", 0), who("ana")).await.unwrap_err();
    assert_eq!(err.entity_error::<ShelfError>(), Some(&ShelfError::ZeroCapacity));

    let created = client.create(shelf("real", 1), who("ana")).await.unwrap();
    assert_eq!(created.id, 1);
}

#[tokio::test]
async fn reads_respect_the_principal() {
    let (actor, client) = ResourceActor::<Shelf>::new(10);
    tokio::spawn(actor.run(()));

    client.create(shelf("private", 1), who("ana")).await.unwrap();

    let err = client.get(1, who("bo")).await.unwrap_err();
    assert_eq!(err.entity_error::<ShelfError>(), Some(&ShelfError::Forbidden));
    assert!(client.get(1, who("admin")).await.unwrap().is_some());
}

#[tokio::test]
async fn list_filters_and_keeps_creation_order() {
    let (actor, client) = ResourceActor::<Shelf>::new(10);
    tokio::spawn(actor.run(()));

    for label in ["a", "b", "a", "c", "a"] {
        client.create(shelf(label, 1), who("ana")).await.unwrap();
    }

    let all = client.list(ShelfQuery::All, who("ana")).await.unwrap();
    let ids: Vec<u32> = all.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);

    let only_a = client
        .list(ShelfQuery::Labelled("a".into()), who("ana"))
        .await
        .unwrap();
    let ids: Vec<u32> = only_a.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 3, 5]);
}

#[tokio::test]
async fn missing_ids_report_not_found() {
    let (actor, client) = ResourceActor::<Shelf>::new(10);
    tokio::spawn(actor.run(()));

    assert!(matches!(
        client.update(9, "x".into(), who("ana")).await,
        Err(FrameworkError::NotFound(id)) if id == "9"
    ));
    assert!(matches!(
        client.delete(9, who("ana")).await,
        Err(FrameworkError::NotFound(_))
    ));
    assert!(matches!(
        client.perform_action(9, ShelfAction::Take(1), who("ana")).await,
        Err(FrameworkError::NotFound(_))
    ));
}

#[tokio::test]
async fn closed_actor_is_reported() {
    let (actor, client) = ResourceActor::<Shelf>::new(10);
    drop(actor);

    assert!(matches!(
        client.get(1, who("ana")).await,
        Err(FrameworkError::ActorClosed)
    ));
}
