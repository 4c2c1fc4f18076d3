//! Ledger schema.
//!
//! - `users`: read model of authenticated users
//! - `events`: shared expense groups
//! - `participants`: event members, user-backed or guests
//! - `expenses`, `expense_payers`, `expense_beneficiaries`: who paid and who benefited
//! - `settlements`: direct transfers between participants
//! - `collectors`: receiving account of an event
//! - `payment_requests`: payer-initiated transfers awaiting confirmation

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Name,
    Email,
    BankName,
    AccountNumber,
    AccountHolder,
    CreatedAt,
}

#[derive(Iden)]
enum Events {
    Table,
    Id,
    Name,
    Description,
    Currency,
    Status,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Participants {
    Table,
    Id,
    EventId,
    UserId,
    Name,
    BankName,
    AccountNumber,
    AccountHolder,
    JoinedAt,
    LeftAt,
}

#[derive(Iden)]
enum Expenses {
    Table,
    Id,
    EventId,
    Description,
    Total,
    ExpenseDate,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum ExpensePayers {
    Table,
    Id,
    ExpenseId,
    ParticipantId,
    Amount,
}

#[derive(Iden)]
enum ExpenseBeneficiaries {
    Table,
    Id,
    ExpenseId,
    ParticipantId,
    Ratio,
}

#[derive(Iden)]
enum Settlements {
    Table,
    Id,
    EventId,
    PayerId,
    ReceiverId,
    Amount,
    PaymentRequestId,
    CreatedAt,
}

#[derive(Iden)]
enum Collectors {
    Table,
    Id,
    EventId,
    ParticipantId,
    BankName,
    AccountNumber,
    AccountHolder,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum PaymentRequests {
    Table,
    Id,
    EventId,
    PayerId,
    ReceiverId,
    Amount,
    Status,
    CreatedAt,
    UpdatedAt,
}

fn money<T: IntoIden>(col: T) -> ColumnDef {
    let mut def = ColumnDef::new(col);
    def.decimal_len(19, 4).not_null();
    def
}

fn event_fk<T: IntoIden + 'static>(name: &str, table: T, col: T) -> ForeignKeyCreateStatement {
    ForeignKey::create()
        .name(name)
        .from(table, col)
        .to(Events::Table, Events::Id)
        .on_delete(ForeignKeyAction::Cascade)
        .to_owned()
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    #[allow(clippy::too_many_lines)]
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Users::Name).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Users::Email)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::BankName).string_len(100))
                    .col(ColumnDef::new(Users::AccountNumber).string_len(50))
                    .col(ColumnDef::new(Users::AccountHolder).string_len(100))
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Events::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Events::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Events::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Events::Description).text())
                    .col(ColumnDef::new(Events::Currency).string_len(3).not_null())
                    .col(
                        ColumnDef::new(Events::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Events::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(Events::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Events::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-events-created_by")
                            .from(Events::Table, Events::CreatedBy)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Participants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Participants::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Participants::EventId).uuid().not_null())
                    .col(ColumnDef::new(Participants::UserId).uuid())
                    .col(ColumnDef::new(Participants::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Participants::BankName).string_len(100))
                    .col(ColumnDef::new(Participants::AccountNumber).string_len(50))
                    .col(ColumnDef::new(Participants::AccountHolder).string_len(100))
                    .col(
                        ColumnDef::new(Participants::JoinedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Participants::LeftAt).timestamp_with_time_zone())
                    .foreign_key(&mut event_fk(
                        "fk-participants-event_id",
                        Participants::Table,
                        Participants::EventId,
                    ))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-participants-user_id")
                            .from(Participants::Table, Participants::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-participants-event_id-user_id-unique")
                    .table(Participants::Table)
                    .col(Participants::EventId)
                    .col(Participants::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Expenses::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Expenses::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Expenses::EventId).uuid().not_null())
                    .col(
                        ColumnDef::new(Expenses::Description)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(money(Expenses::Total).check(Expr::col(Expenses::Total).gt(0)))
                    .col(
                        ColumnDef::new(Expenses::ExpenseDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Expenses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Expenses::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(&mut event_fk(
                        "fk-expenses-event_id",
                        Expenses::Table,
                        Expenses::EventId,
                    ))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expenses-event_id-expense_date")
                    .table(Expenses::Table)
                    .col(Expenses::EventId)
                    .col(Expenses::ExpenseDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ExpensePayers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExpensePayers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ExpensePayers::ExpenseId).uuid().not_null())
                    .col(ColumnDef::new(ExpensePayers::ParticipantId).uuid().not_null())
                    .col(money(ExpensePayers::Amount))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expense_payers-expense_id")
                            .from(ExpensePayers::Table, ExpensePayers::ExpenseId)
                            .to(Expenses::Table, Expenses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expense_payers-participant_id")
                            .from(ExpensePayers::Table, ExpensePayers::ParticipantId)
                            .to(Participants::Table, Participants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expense_payers-expense_id-participant_id-unique")
                    .table(ExpensePayers::Table)
                    .col(ExpensePayers::ExpenseId)
                    .col(ExpensePayers::ParticipantId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ExpenseBeneficiaries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ExpenseBeneficiaries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ExpenseBeneficiaries::ExpenseId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExpenseBeneficiaries::ParticipantId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ExpenseBeneficiaries::Ratio)
                            .decimal_len(20, 10)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expense_beneficiaries-expense_id")
                            .from(ExpenseBeneficiaries::Table, ExpenseBeneficiaries::ExpenseId)
                            .to(Expenses::Table, Expenses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-expense_beneficiaries-participant_id")
                            .from(
                                ExpenseBeneficiaries::Table,
                                ExpenseBeneficiaries::ParticipantId,
                            )
                            .to(Participants::Table, Participants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-expense_beneficiaries-expense_id-participant_id-unique")
                    .table(ExpenseBeneficiaries::Table)
                    .col(ExpenseBeneficiaries::ExpenseId)
                    .col(ExpenseBeneficiaries::ParticipantId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PaymentRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentRequests::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PaymentRequests::EventId).uuid().not_null())
                    .col(ColumnDef::new(PaymentRequests::PayerId).uuid().not_null())
                    .col(ColumnDef::new(PaymentRequests::ReceiverId).uuid().not_null())
                    .col(
                        money(PaymentRequests::Amount)
                            .check(Expr::col(PaymentRequests::Amount).gt(0)),
                    )
                    .col(
                        ColumnDef::new(PaymentRequests::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(PaymentRequests::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentRequests::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(&mut event_fk(
                        "fk-payment_requests-event_id",
                        PaymentRequests::Table,
                        PaymentRequests::EventId,
                    ))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payment_requests-payer_id")
                            .from(PaymentRequests::Table, PaymentRequests::PayerId)
                            .to(Participants::Table, Participants::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payment_requests-receiver_id")
                            .from(PaymentRequests::Table, PaymentRequests::ReceiverId)
                            .to(Participants::Table, Participants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Settlements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Settlements::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Settlements::EventId).uuid().not_null())
                    .col(ColumnDef::new(Settlements::PayerId).uuid().not_null())
                    .col(ColumnDef::new(Settlements::ReceiverId).uuid().not_null())
                    .col(money(Settlements::Amount).check(Expr::col(Settlements::Amount).gt(0)))
                    .col(ColumnDef::new(Settlements::PaymentRequestId).uuid().unique_key())
                    .col(
                        ColumnDef::new(Settlements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(&mut event_fk(
                        "fk-settlements-event_id",
                        Settlements::Table,
                        Settlements::EventId,
                    ))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-settlements-payer_id")
                            .from(Settlements::Table, Settlements::PayerId)
                            .to(Participants::Table, Participants::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-settlements-receiver_id")
                            .from(Settlements::Table, Settlements::ReceiverId)
                            .to(Participants::Table, Participants::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-settlements-payment_request_id")
                            .from(Settlements::Table, Settlements::PaymentRequestId)
                            .to(PaymentRequests::Table, PaymentRequests::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Collectors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Collectors::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Collectors::EventId).uuid().not_null())
                    .col(ColumnDef::new(Collectors::ParticipantId).uuid().not_null())
                    .col(ColumnDef::new(Collectors::BankName).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Collectors::AccountNumber)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Collectors::AccountHolder)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Collectors::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Collectors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(&mut event_fk(
                        "fk-collectors-event_id",
                        Collectors::Table,
                        Collectors::EventId,
                    ))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-collectors-participant_id")
                            .from(Collectors::Table, Collectors::ParticipantId)
                            .to(Participants::Table, Participants::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            Collectors::Table.into_iden(),
            Settlements::Table.into_iden(),
            PaymentRequests::Table.into_iden(),
            ExpenseBeneficiaries::Table.into_iden(),
            ExpensePayers::Table.into_iden(),
            Expenses::Table.into_iden(),
            Participants::Table.into_iden(),
            Events::Table.into_iden(),
            Users::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}
