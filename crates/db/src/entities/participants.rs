//! `SeaORM` Entity for participants table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::BankInfo;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "participants")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub event_id: Uuid,
    /// Absent for guests.
    pub user_id: Option<Uuid>,
    pub name: String,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub account_holder: Option<String>,
    pub joined_at: DateTimeWithTimeZone,
    /// Set when the participant leaves or is removed.
    pub left_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::events::Entity",
        from = "Column::EventId",
        to = "super::events::Column::Id",
        on_delete = "Cascade"
    )]
    Events,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// True until the participant leaves or is removed.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.left_at.is_none()
    }

    /// Participant bank details.
    #[must_use]
    pub fn bank_info(&self) -> BankInfo {
        BankInfo::new(
            self.bank_name.clone(),
            self.account_number.clone(),
            self.account_holder.clone(),
        )
    }
}
