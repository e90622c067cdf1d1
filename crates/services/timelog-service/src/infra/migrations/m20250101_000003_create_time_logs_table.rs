//! Migration: Create time_logs table.

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_users_table::Users;
use super::m20250101_000002_create_projects_table::Projects;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TimeLogs::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TimeLogs::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(TimeLogs::ProjectId).uuid().not_null())
                    .col(ColumnDef::new(TimeLogs::UserId).uuid().not_null())
                    .col(ColumnDef::new(TimeLogs::Hours).double().not_null())
                    .col(ColumnDef::new(TimeLogs::Notes).text().not_null())
                    .col(ColumnDef::new(TimeLogs::LogDate).date().not_null())
                    .col(
                        ColumnDef::new(TimeLogs::Status)
                            .string_len(16)
                            .not_null()
                            .default("TODO"),
                    )
                    .col(
                        ColumnDef::new(TimeLogs::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(TimeLogs::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_time_logs_project")
                            .from(TimeLogs::Table, TimeLogs::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_time_logs_user")
                            .from(TimeLogs::Table, TimeLogs::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Daily quota lookups
        manager
            .create_index(
                Index::create()
                    .name("idx_time_logs_user_date")
                    .table(TimeLogs::Table)
                    .col(TimeLogs::UserId)
                    .col(TimeLogs::LogDate)
                    .to_owned(),
            )
            .await?;

        // Billing aggregation
        manager
            .create_index(
                Index::create()
                    .name("idx_time_logs_project")
                    .table(TimeLogs::Table)
                    .col(TimeLogs::ProjectId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TimeLogs::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum TimeLogs {
    Table,
    Id,
    ProjectId,
    UserId,
    Hours,
    Notes,
    LogDate,
    Status,
    CreatedAt,
    UpdatedAt,
}
