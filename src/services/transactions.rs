//! Payment transaction ledger queries

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{transaction::Transaction, user::Role},
    repository::Repository,
};

#[derive(Clone)]
pub struct TransactionsService {
    repository: Repository,
}

impl TransactionsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_all(&self) -> AppResult<Vec<Transaction>> {
        self.repository.transactions.list_all().await
    }

    /// Transactions a user paid (guests) or received (agents)
    pub async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<Transaction>> {
        let user = self.repository.users.get_by_id(user_id).await?;
        match user.role {
            Role::User => self.repository.transactions.list_by_guest(user_id).await,
            Role::Agent => self.repository.transactions.list_by_owner(user_id).await,
            Role::Admin => self.repository.transactions.list_all().await,
        }
    }
}
