use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::seats::SeatMap;

#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "trip_status")]
#[serde(rename_all = "lowercase")]
pub enum TripStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "trip")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTimeWithTimeZone,
    pub price: f64,
    pub original_price: Option<f64>,
    pub discount_percent: Option<f64>,
    pub total_seats: i32,
    /// Derived from `seat_map`; recomputed inside every committed mutation.
    pub available_seats: i32,
    #[sea_orm(column_type = "JsonBinary")]
    pub seat_map: SeatMap,
    pub status: TripStatus,
    pub is_deleted: bool,
    pub created_by: Option<Uuid>,
    /// Optimistic-lock counter; every seat-map write is conditional on it.
    pub version: i32,
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Whether new bookings may be created against this trip.
    pub fn is_bookable(&self) -> bool {
        self.status == TripStatus::Active && !self.is_deleted
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id"
    )]
    CreatedBy,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
