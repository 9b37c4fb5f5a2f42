//! Initial schema: users, roles, permissions, refresh tokens, sessions,
//! activity logs, and login history.

use sea_orm::Schema;
use sea_orm_migration::prelude::*;

use crate::entities::{
    activity_logs, login_history, permissions, refresh_tokens, role_permissions, roles, sessions,
    users,
};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());

        manager
            .create_table(schema.create_table_from_entity(roles::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(permissions::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(role_permissions::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(users::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(refresh_tokens::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(sessions::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(activity_logs::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(login_history::Entity))
            .await?;

        // Session lookup by token digest is the hot path of every
        // authenticated request.
        manager
            .create_index(
                Index::create()
                    .name("idx_sessions_token_hash")
                    .table(sessions::Entity)
                    .col(sessions::Column::TokenHash)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_sessions_user")
                    .table(sessions::Entity)
                    .col(sessions::Column::UserId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_refresh_tokens_user")
                    .table(refresh_tokens::Entity)
                    .col(refresh_tokens::Column::UserId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_refresh_tokens_family")
                    .table(refresh_tokens::Entity)
                    .col(refresh_tokens::Column::Family)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_activity_logs_user_created")
                    .table(activity_logs::Entity)
                    .col(activity_logs::Column::UserId)
                    .col(activity_logs::Column::CreatedAt)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_login_history_user_created")
                    .table(login_history::Entity)
                    .col(login_history::Column::UserId)
                    .col(login_history::Column::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(login_history::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(activity_logs::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(sessions::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(refresh_tokens::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(users::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(role_permissions::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(permissions::Entity).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(roles::Entity).to_owned())
            .await?;
        Ok(())
    }
}
