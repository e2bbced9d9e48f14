use sea_orm_migration::prelude::*;

use crate::m20251101_000001_create_vendors_and_service_areas::{ServiceAreas, Vendors};

#[derive(DeriveIden)]
pub(crate) enum Products {
    Table,
    Id,
    VendorId,
    ServiceAreaId,
    Name,
    Price,
    Description,
    IsActive,
    ImagePath,
    SortOrder,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Products::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Products::VendorId).uuid().not_null())
                    .col(ColumnDef::new(Products::ServiceAreaId).uuid().null())
                    .col(ColumnDef::new(Products::Name).string().not_null())
                    // 价格以最小货币单位（agorot）存储
                    .col(ColumnDef::new(Products::Price).big_integer().not_null())
                    .col(ColumnDef::new(Products::Description).text().null())
                    .col(
                        ColumnDef::new(Products::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Products::ImagePath).string().null())
                    .col(
                        ColumnDef::new(Products::SortOrder)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Products::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Products::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_products_vendor")
                            .from(Products::Table, Products::VendorId)
                            .to(Vendors::Table, Vendors::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_products_service_area")
                            .from(Products::Table, Products::ServiceAreaId)
                            .to(ServiceAreas::Table, ServiceAreas::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_products_vendor_area")
                    .table(Products::Table)
                    .col(Products::VendorId)
                    .col(Products::ServiceAreaId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;
        Ok(())
    }
}
