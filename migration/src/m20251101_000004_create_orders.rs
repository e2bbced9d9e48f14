use sea_orm_migration::prelude::*;

use crate::m20251101_000001_create_vendors_and_service_areas::{ServiceAreas, Vendors};

#[derive(DeriveIden)]
pub(crate) enum Orders {
    Table,
    Id,
    VendorId,
    ServiceAreaId,
    CustomerPhone,
    CustomerNote,
    Lat,
    Lng,
    TotalAmount,
    Currency,
    Status,
    PaymentStatus,
    PaymentUrl,
    PaymentReference,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum OrderItems {
    Table,
    Id,
    OrderId,
    ProductId,
    Name,
    Price,
    Quantity,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Orders::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Orders::VendorId).uuid().not_null())
                    .col(ColumnDef::new(Orders::ServiceAreaId).uuid().not_null())
                    .col(ColumnDef::new(Orders::CustomerPhone).string().not_null())
                    .col(ColumnDef::new(Orders::CustomerNote).text().null())
                    .col(ColumnDef::new(Orders::Lat).double().null())
                    .col(ColumnDef::new(Orders::Lng).double().null())
                    .col(ColumnDef::new(Orders::TotalAmount).big_integer().not_null())
                    .col(ColumnDef::new(Orders::Currency).string_len(3).not_null())
                    .col(ColumnDef::new(Orders::Status).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Orders::PaymentStatus)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Orders::PaymentUrl).text().null())
                    .col(ColumnDef::new(Orders::PaymentReference).string().null())
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_vendor")
                            .from(Orders::Table, Orders::VendorId)
                            .to(Vendors::Table, Vendors::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_service_area")
                            .from(Orders::Table, Orders::ServiceAreaId)
                            .to(ServiceAreas::Table, ServiceAreas::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_scope_created")
                    .table(Orders::Table)
                    .col(Orders::VendorId)
                    .col(Orders::ServiceAreaId)
                    .col(Orders::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // order_items 不引用 products 外键：行项目是收据快照，产品删除后仍需保留
        manager
            .create_table(
                Table::create()
                    .table(OrderItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                    .col(ColumnDef::new(OrderItems::ProductId).uuid().not_null())
                    .col(ColumnDef::new(OrderItems::Name).string().not_null())
                    .col(ColumnDef::new(OrderItems::Price).big_integer().not_null())
                    .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_items_order")
                            .from(OrderItems::Table, OrderItems::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderItems::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await?;
        Ok(())
    }
}
