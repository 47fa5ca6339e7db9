//! # User Client
//!
//! High-level API for the User actor. Wraps a `ResourceClient<Account>`.
use super::Principal;
use crate::model::{User, UserId};
use crate::user_actor::{
    Account, AccountAction, AccountActionResult, AccountCreate, AccountQuery, AccountUpdate,
    UserError,
};
use async_trait::async_trait;
use resource_framework::{FrameworkError, ResourceClient, ResourceHandle};
use tracing::{debug, instrument};

/// Client for interacting with the User actor.
#[derive(Clone)]
pub struct UserClient {
    inner: ResourceClient<Account>,
}

impl UserClient {
    pub fn new(inner: ResourceClient<Account>) -> Self {
        Self { inner }
    }

    #[instrument(skip(self))]
    pub async fn create_account(
        &self,
        params: AccountCreate,
        principal: Principal,
    ) -> Result<Account, UserError> {
        debug!("Sending request");
        self.inner
            .create(params, principal)
            .await
            .map_err(Self::map_error)
    }

    #[instrument(skip(self))]
    pub async fn update_account(
        &self,
        id: UserId,
        update: AccountUpdate,
        principal: Principal,
    ) -> Result<Account, UserError> {
        debug!("Sending request");
        self.inner
            .update(id, update, principal)
            .await
            .map_err(Self::map_error)
    }

    /// Looks an account up by email, as the system.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>, UserError> {
        let found = self
            .find(AccountQuery::Email(email.to_string()), Principal::System)
            .await?;
        Ok(found.into_iter().next())
    }

    /// Resolves a bearer token to its account, as the system.
    pub async fn find_by_token(&self, token: &str) -> Result<Option<Account>, UserError> {
        let found = self
            .find(AccountQuery::Token(token.to_string()), Principal::System)
            .await?;
        Ok(found.into_iter().next())
    }

    /// Checks the password and returns a fresh token.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, id: UserId, password: String) -> Result<String, UserError> {
        debug!("Sending request");
        match self
            .inner
            .perform_action(id, AccountAction::Authenticate { password }, Principal::System)
            .await
        {
            Ok(AccountActionResult::Authenticate(token)) => Ok(token),
            Ok(other) => Err(unexpected(other)),
            Err(e) => Err(Self::map_error(e)),
        }
    }

    #[instrument(skip(self))]
    pub async fn issue_token(&self, id: UserId, principal: Principal) -> Result<String, UserError> {
        debug!("Sending request");
        match self
            .inner
            .perform_action(id, AccountAction::IssueToken, principal)
            .await
        {
            Ok(AccountActionResult::IssueToken(token)) => Ok(token),
            Ok(other) => Err(unexpected(other)),
            Err(e) => Err(Self::map_error(e)),
        }
    }

    #[instrument(skip(self))]
    pub async fn promote(&self, id: UserId, principal: Principal) -> Result<User, UserError> {
        debug!("Sending request");
        match self
            .inner
            .perform_action(id, AccountAction::Promote, principal)
            .await
        {
            Ok(AccountActionResult::Promote(user)) => Ok(user),
            Ok(other) => Err(unexpected(other)),
            Err(e) => Err(Self::map_error(e)),
        }
    }
}

fn unexpected(result: AccountActionResult) -> UserError {
    UserError::ActorCommunicationError(format!("unexpected action result: {result:?}"))
}

#[async_trait]
impl ResourceHandle<Account> for UserClient {
    type Error = UserError;

    fn inner(&self) -> &ResourceClient<Account> {
        &self.inner
    }

    fn map_error(e: FrameworkError) -> UserError {
        if let Some(entity) = e.entity_error::<UserError>() {
            return entity.clone();
        }
        match e {
            FrameworkError::NotFound(id) => UserError::NotFound(id),
            other => UserError::ActorCommunicationError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use resource_framework::mock::{create_mock_client, expect_action, MockClient};

    #[tokio::test]
    async fn entity_errors_keep_their_type() {
        let mut mock = MockClient::<Account>::new();
        mock.expect_action(UserId::from(1))
            .return_err(FrameworkError::EntityError(Box::new(UserError::AlreadyAdmin)));
        mock.expect_action(UserId::from(2))
            .return_err(FrameworkError::NotFound("user_2".into()));
        let client = UserClient::new(mock.client());

        let admin = Principal::Admin(UserId::from(9));
        assert_eq!(
            client.promote(UserId::from(1), admin.clone()).await,
            Err(UserError::AlreadyAdmin)
        );
        assert_eq!(
            client.promote(UserId::from(2), admin).await,
            Err(UserError::NotFound("user_2".into()))
        );
        mock.verify();
    }

    #[tokio::test]
    async fn authenticate_runs_as_the_system() {
        let (client, mut receiver) = create_mock_client::<Account>(4);
        let client = UserClient::new(client);

        let login =
            tokio::spawn(async move { client.authenticate(UserId::from(1), "pw".into()).await });

        let (id, action, responder) = expect_action(&mut receiver)
            .await
            .expect("Expected Action request");
        assert_eq!(id, UserId::from(1));
        assert!(matches!(action, AccountAction::Authenticate { ref password } if password == "pw"));
        responder
            .send(Ok(AccountActionResult::Authenticate("t1".into())))
            .unwrap();

        assert_eq!(login.await.unwrap(), Ok("t1".to_string()));
    }
}
