//! Create the image_records table
//!
//! One row per (site_id, image_key). The composite primary key is what turns
//! a second insert for the same key into a unique violation.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ImageRecords::Table)
                    .if_not_exists()
                    .col(Self::create_key_column(ImageRecords::SiteId, 128))
                    .col(Self::create_key_column(ImageRecords::ImageKey, 512))
                    .col(ColumnDef::new(ImageRecords::SourceUrl).text().not_null())
                    .col(ColumnDef::new(ImageRecords::ImageName).text().not_null())
                    .col(ColumnDef::new(ImageRecords::RawLocation).text().not_null())
                    .col(
                        ColumnDef::new(ImageRecords::OptimizedLocation)
                            .text()
                            .not_null(),
                    )
                    .col(Self::create_timestamp_column(manager, ImageRecords::CreatedAt))
                    .primary_key(
                        Index::create()
                            .name("pk_image_records")
                            .col(ImageRecords::SiteId)
                            .col(ImageRecords::ImageKey),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_image_records_created_at")
                    .table(ImageRecords::Table)
                    .col(ImageRecords::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ImageRecords::Table).to_owned())
            .await
    }
}

impl Migration {
    /// Bounded key columns. Under utf8mb4 the composite key stays inside
    /// InnoDB's 3072 byte index limit: (128 + 512) * 4 = 2560.
    fn create_key_column(column_name: impl sea_orm::Iden + 'static, length: u32) -> ColumnDef {
        ColumnDef::new(column_name)
            .string_len(length)
            .not_null()
            .to_owned()
    }

    fn create_timestamp_column(
        manager: &SchemaManager<'_>,
        column_name: impl sea_orm::Iden + 'static,
    ) -> ColumnDef {
        match manager.get_database_backend() {
            sea_orm::DatabaseBackend::Postgres => ColumnDef::new(column_name)
                .timestamp_with_time_zone()
                .not_null()
                .to_owned(),
            _ => ColumnDef::new(column_name).timestamp().not_null().to_owned(),
        }
    }
}

#[derive(DeriveIden)]
pub enum ImageRecords {
    Table,
    SiteId,
    ImageKey,
    SourceUrl,
    ImageName,
    RawLocation,
    OptimizedLocation,
    CreatedAt,
}
