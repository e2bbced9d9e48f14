use sea_orm_migration::prelude::*;

use crate::m20251101_000001_create_vendors_and_service_areas::{ServiceAreas, Vendors};

#[derive(DeriveIden)]
enum StaffMembers {
    Table,
    Id,
    UserId,
    VendorId,
    ServiceAreaId,
    Role,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum StaffInvites {
    Table,
    Id,
    VendorId,
    ServiceAreaId,
    Email,
    Role,
    Token,
    UsedAt,
    UsedBy,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StaffMembers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StaffMembers::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StaffMembers::UserId).uuid().not_null())
                    .col(ColumnDef::new(StaffMembers::VendorId).uuid().not_null())
                    .col(ColumnDef::new(StaffMembers::ServiceAreaId).uuid().null())
                    .col(ColumnDef::new(StaffMembers::Role).string_len(16).not_null())
                    .col(
                        ColumnDef::new(StaffMembers::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(StaffMembers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_staff_members_vendor")
                            .from(StaffMembers::Table, StaffMembers::VendorId)
                            .to(Vendors::Table, Vendors::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_staff_members_service_area")
                            .from(StaffMembers::Table, StaffMembers::ServiceAreaId)
                            .to(ServiceAreas::Table, ServiceAreas::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_staff_members_user_id")
                    .table(StaffMembers::Table)
                    .col(StaffMembers::UserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(StaffInvites::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StaffInvites::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StaffInvites::VendorId).uuid().not_null())
                    .col(ColumnDef::new(StaffInvites::ServiceAreaId).uuid().null())
                    .col(ColumnDef::new(StaffInvites::Email).string().not_null())
                    .col(ColumnDef::new(StaffInvites::Role).string_len(16).not_null())
                    .col(
                        ColumnDef::new(StaffInvites::Token)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(StaffInvites::UsedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(StaffInvites::UsedBy).uuid().null())
                    .col(
                        ColumnDef::new(StaffInvites::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_staff_invites_vendor")
                            .from(StaffInvites::Table, StaffInvites::VendorId)
                            .to(Vendors::Table, Vendors::Id),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StaffInvites::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StaffMembers::Table).to_owned())
            .await?;
        Ok(())
    }
}
