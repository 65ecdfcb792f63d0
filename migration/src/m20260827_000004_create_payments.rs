use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20260827_000001_create_users::User;
use super::m20260827_000003_create_bookings::Booking;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(PaymentState::Enum)
                    .values([
                        PaymentState::Pending,
                        PaymentState::Processing,
                        PaymentState::Completed,
                        PaymentState::Failed,
                        PaymentState::Cancelled,
                        PaymentState::Refunded,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Payment::Table)
                    .if_not_exists()
                    .col(uuid(Payment::Id).primary_key())
                    .col(uuid(Payment::BookingId).not_null())
                    .col(uuid(Payment::UserId).not_null())
                    .col(double(Payment::Amount).not_null())
                    .col(string_len(Payment::Method, 30).not_null())
                    .col(string_len_null(Payment::CardLast4, 4))
                    .col(string_len_null(Payment::CardHolder, 100))
                    .col(
                        ColumnDef::new(Payment::Status)
                            .custom(PaymentState::Enum)
                            .not_null(),
                    )
                    .col(string_len_null(Payment::TransactionId, 40).unique_key())
                    .col(string_null(Payment::FailureReason))
                    .col(double_null(Payment::RefundAmount))
                    .col(string_null(Payment::RefundReason))
                    .col(timestamp_with_time_zone_null(Payment::PaidAt))
                    .col(timestamp_with_time_zone_null(Payment::RefundedAt))
                    .col(
                        timestamp_with_time_zone(Payment::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_booking")
                            .from(Payment::Table, Payment::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payment_user")
                            .from(Payment::Table, Payment::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payment_booking")
                    .table(Payment::Table)
                    .col(Payment::BookingId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Payment::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(PaymentState::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Payment {
    Table,
    Id,
    BookingId,
    UserId,
    Amount,
    Method,
    CardLast4,
    CardHolder,
    Status,
    TransactionId,
    FailureReason,
    RefundAmount,
    RefundReason,
    PaidAt,
    RefundedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum PaymentState {
    #[sea_orm(iden = "payment_state")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "processing")]
    Processing,
    #[sea_orm(iden = "completed")]
    Completed,
    #[sea_orm(iden = "failed")]
    Failed,
    #[sea_orm(iden = "cancelled")]
    Cancelled,
    #[sea_orm(iden = "refunded")]
    Refunded,
}
