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
                    .col(
                        ColumnDef::new(Users::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Users::CoinBalance)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Users::CoinBalance).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Merch::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Merch::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Merch::Name).string().not_null().unique_key())
                    .col(
                        ColumnDef::new(Merch::Price)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Merch::Price).gt(0)),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::FromUser).big_integer().not_null())
                    .col(ColumnDef::new(Transactions::ToUser).big_integer().null())
                    .col(
                        ColumnDef::new(Transactions::Amount)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Transactions::Amount).gt(0)),
                    )
                    .col(
                        ColumnDef::new(Transactions::Kind)
                            .string_len(16)
                            .not_null()
                            .check(Expr::col(Transactions::Kind).is_in(["transfer", "purchase"])),
                    )
                    .col(
                        ColumnDef::new(Transactions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_from_user")
                            .from(Transactions::Table, Transactions::FromUser)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_to_user")
                            .from(Transactions::Table, Transactions::ToUser)
                            .to(Users::Table, Users::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Purchases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Purchases::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Purchases::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Purchases::MerchId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Purchases::Quantity)
                            .integer()
                            .not_null()
                            .default(1)
                            .check(Expr::col(Purchases::Quantity).gt(0)),
                    )
                    .col(
                        ColumnDef::new(Purchases::PurchasedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchases_user")
                            .from(Purchases::Table, Purchases::UserId)
                            .to(Users::Table, Users::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchases_merch")
                            .from(Purchases::Table, Purchases::MerchId)
                            .to(Merch::Table, Merch::Id),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, table, column) in [
            (
                "idx_transactions_from_user",
                Transactions::Table,
                Transactions::FromUser,
            ),
            (
                "idx_transactions_to_user",
                Transactions::Table,
                Transactions::ToUser,
            ),
        ] {
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name(name)
                        .table(table)
                        .col(column)
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_purchases_user")
                    .table(Purchases::Table)
                    .col(Purchases::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Purchases::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Merch::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    PasswordHash,
    CoinBalance,
    CreatedAt,
}

#[derive(DeriveIden)]
pub(super) enum Merch {
    Table,
    Id,
    Name,
    Price,
}

#[derive(DeriveIden)]
enum Transactions {
    Table,
    Id,
    FromUser,
    ToUser,
    Amount,
    Kind,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Purchases {
    Table,
    Id,
    UserId,
    MerchId,
    Quantity,
    PurchasedAt,
}
