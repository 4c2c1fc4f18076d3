//! `SeaORM` Entity for collectors table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use tally_core::BankInfo;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "collectors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub event_id: Uuid,
    pub participant_id: Uuid,
    pub bank_name: String,
    pub account_number: String,
    pub account_holder: String,
    /// At most one active row per event.
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
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
        belongs_to = "super::participants::Entity",
        from = "Column::ParticipantId",
        to = "super::participants::Column::Id"
    )]
    Participants,
}

impl Related<super::events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl Related<super::participants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Participants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Collector bank details.
    #[must_use]
    pub fn bank_info(&self) -> BankInfo {
        BankInfo::new(
            Some(self.bank_name.clone()),
            Some(self.account_number.clone()),
            Some(self.account_holder.clone()),
        )
    }
}
