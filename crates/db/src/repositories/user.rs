//! User repository for the users read model.

use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tally_core::BankInfo;
use tally_shared::AppResult;
use tally_shared::types::UserId;

use crate::entities::users;
use crate::repositories::scope::{db_error, insert_error, now};

/// User repository.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: UserId) -> AppResult<Option<users::Model>> {
        users::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(db_error)
    }

    /// Finds a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(db_error)
    }

    /// Registers a user in the read model.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` for a taken email, `Internal` on storage failure.
    pub async fn create(&self, name: &str, email: &str, bank: BankInfo) -> AppResult<users::Model> {
        let bank = bank.normalized();
        users::ActiveModel {
            id: Set(UserId::new().into_inner()),
            name: Set(name.trim().to_string()),
            email: Set(email.trim().to_lowercase()),
            bank_name: Set(bank.bank_name),
            account_number: Set(bank.account_number),
            account_holder: Set(bank.account_holder),
            created_at: Set(now()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| insert_error(e, "user"))
    }
}
