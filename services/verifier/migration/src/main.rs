use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    cli::run_cli(mailotp_verifier_migration::Migrator).await;
}
