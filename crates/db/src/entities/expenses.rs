//! `SeaORM` Entity for expenses table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub event_id: Uuid,
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total: Decimal,
    pub expense_date: DateTimeWithTimeZone,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
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
    #[sea_orm(has_many = "super::expense_payers::Entity")]
    ExpensePayers,
    #[sea_orm(has_many = "super::expense_beneficiaries::Entity")]
    ExpenseBeneficiaries,
}

impl Related<super::events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl Related<super::expense_payers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpensePayers.def()
    }
}

impl Related<super::expense_beneficiaries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ExpenseBeneficiaries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
