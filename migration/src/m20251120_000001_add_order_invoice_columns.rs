use sea_orm_migration::prelude::*;

use crate::m20251101_000004_create_orders::Orders;

#[derive(DeriveIden)]
enum InvoiceColumns {
    InvoiceId,
    InvoiceUrl,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // SQLite 不支持一次 ALTER 多列，分开执行
        manager
            .alter_table(
                Table::alter()
                    .table(Orders::Table)
                    .add_column(ColumnDef::new(InvoiceColumns::InvoiceId).string().null())
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Orders::Table)
                    .add_column(ColumnDef::new(InvoiceColumns::InvoiceUrl).text().null())
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Orders::Table)
                    .drop_column(InvoiceColumns::InvoiceUrl)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Orders::Table)
                    .drop_column(InvoiceColumns::InvoiceId)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}
