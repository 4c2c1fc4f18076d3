//! `SeaORM` Entity for the users read model.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::BankInfo;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub account_holder: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::participants::Entity")]
    Participants,
}

impl Related<super::participants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Profile bank details.
    #[must_use]
    pub fn bank_info(&self) -> BankInfo {
        BankInfo::new(
            self.bank_name.clone(),
            self.account_number.clone(),
            self.account_holder.clone(),
        )
    }
}
