use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20260827_000001_create_users::User;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create trip status enum
        manager
            .create_type(
                Type::create()
                    .as_enum(TripStatus::Enum)
                    .values([TripStatus::Active, TripStatus::Inactive])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Trip::Table)
                    .if_not_exists()
                    .col(uuid(Trip::Id).primary_key())
                    .col(string_len(Trip::Origin, 100).not_null())
                    .col(string_len(Trip::Destination, 100).not_null())
                    .col(timestamp_with_time_zone(Trip::DepartureTime).not_null())
                    .col(double(Trip::Price).not_null())
                    .col(double_null(Trip::OriginalPrice))
                    .col(double_null(Trip::DiscountPercent))
                    .col(integer(Trip::TotalSeats).not_null())
                    .col(integer(Trip::AvailableSeats).not_null())
                    .col(json_binary(Trip::SeatMap).not_null())
                    .col(
                        ColumnDef::new(Trip::Status)
                            .custom(TripStatus::Enum)
                            .not_null(),
                    )
                    .col(boolean(Trip::IsDeleted).not_null().default(false))
                    .col(uuid_null(Trip::CreatedBy))
                    .col(integer(Trip::Version).not_null().default(0))
                    .col(
                        timestamp_with_time_zone(Trip::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_trip_created_by")
                            .from(Trip::Table, Trip::CreatedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Route search index
        manager
            .create_index(
                Index::create()
                    .name("idx_trip_route_departure")
                    .table(Trip::Table)
                    .col(Trip::Origin)
                    .col(Trip::Destination)
                    .col(Trip::DepartureTime)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Trip::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(TripStatus::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Trip {
    Table,
    Id,
    Origin,
    Destination,
    DepartureTime,
    Price,
    OriginalPrice,
    DiscountPercent,
    TotalSeats,
    AvailableSeats,
    SeatMap,
    Status,
    IsDeleted,
    CreatedBy,
    Version,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum TripStatus {
    #[sea_orm(iden = "trip_status")]
    Enum,
    #[sea_orm(iden = "active")]
    Active,
    #[sea_orm(iden = "inactive")]
    Inactive,
}
