use sea_orm_migration::prelude::*;

use super::m001_initial::Merch;

/// Catalog shipped with the store: (name, price).
pub const MERCH_SEED: &[(&str, i64)] = &[
    ("t-shirt", 80),
    ("cup", 20),
    ("book", 50),
    ("pen", 10),
    ("powerbank", 200),
    ("hoody", 300),
    ("umbrella", 200),
    ("socks", 10),
    ("wallet", 50),
    ("pink-hoody", 500),
];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert = Query::insert()
            .into_table(Merch::Table)
            .columns([Merch::Name, Merch::Price])
            .to_owned();
        for (name, price) in MERCH_SEED {
            insert.values_panic([(*name).into(), (*price).into()]);
        }
        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let delete = Query::delete()
            .from_table(Merch::Table)
            .and_where(Expr::col(Merch::Name).is_in(MERCH_SEED.iter().map(|(name, _)| *name)))
            .to_owned();
        manager.exec_stmt(delete).await
    }
}
