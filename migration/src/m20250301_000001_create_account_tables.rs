use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::Provider).string().not_null().default("local"))
                    .col(ColumnDef::new(Users::Photo).string().not_null().default("default.png"))
                    .col(ColumnDef::new(Users::Verified).boolean().not_null().default(false))
                    .col(ColumnDef::new(Users::VerificationCode).string().null())
                    .col(ColumnDef::new(Users::PasswordResetToken).string().null())
                    .col(ColumnDef::new(Users::PasswordResetAt).big_integer().null())
                    .col(ColumnDef::new(Users::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Users::DeletedAt).big_integer().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_verification_code")
                    .table(Users::Table)
                    .col(Users::VerificationCode)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_password_reset_token")
                    .table(Users::Table)
                    .col(Users::PasswordResetToken)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(UserRoles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(UserRoles::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(UserRoles::UserId).string().not_null())
                    .col(ColumnDef::new(UserRoles::Role).string_len(32).not_null())
                    .col(ColumnDef::new(UserRoles::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_roles_user_id")
                            .from(UserRoles::Table, UserRoles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One row per (user, role)
        manager
            .create_index(
                Index::create()
                    .name("idx_user_roles_user_id_role")
                    .table(UserRoles::Table)
                    .col(UserRoles::UserId)
                    .col(UserRoles::Role)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Memberships::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Memberships::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Memberships::UserId).string().not_null().unique_key())
                    .col(ColumnDef::new(Memberships::Tier).string_len(32).not_null().default("free"))
                    .col(ColumnDef::new(Memberships::DailyUsageLimit).integer().not_null().default(10))
                    .col(ColumnDef::new(Memberships::DailyUsageCount).integer().not_null().default(0))
                    .col(ColumnDef::new(Memberships::TotalUsageCount).big_integer().not_null().default(0))
                    .col(ColumnDef::new(Memberships::LastUsageDate).big_integer().null())
                    .col(ColumnDef::new(Memberships::MembershipExpireAt).big_integer().null())
                    .col(ColumnDef::new(Memberships::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Memberships::UpdatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Memberships::DeletedAt).big_integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_memberships_user_id")
                            .from(Memberships::Table, Memberships::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Memberships::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(UserRoles::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
pub(crate) enum Users {
    Table,
    Id,
    Name,
    Email,
    PasswordHash,
    Provider,
    Photo,
    Verified,
    VerificationCode,
    PasswordResetToken,
    PasswordResetAt,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveIden)]
enum UserRoles {
    Table,
    Id,
    UserId,
    Role,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Memberships {
    Table,
    Id,
    UserId,
    Tier,
    DailyUsageLimit,
    DailyUsageCount,
    TotalUsageCount,
    LastUsageDate,
    MembershipExpireAt,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
