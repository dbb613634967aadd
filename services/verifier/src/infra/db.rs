use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    sea_query::{Expr, OnConflict},
};

use mailotp_verifier_schema::{identities, otp_records};

use crate::domain::repository::{IdentityRepository, OtpRepository};
use crate::domain::types::{Identity, OtpRecord};
use crate::domain::validation::{EmailAddress, OtpCode};
use crate::error::VerifierError;

/// Postgres-backed ledger and identity store.
///
/// Every mutation runs in one transaction that first locks the address's
/// identity row, so issue and consume for the same address are serialized
/// while different addresses proceed independently.
#[derive(Clone)]
pub struct DbStore {
    pub db: DatabaseConnection,
}

// ── OTP ledger ───────────────────────────────────────────────────────────────

impl OtpRepository for DbStore {
    async fn replace_active(&self, record: &OtpRecord) -> Result<(), VerifierError> {
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                let record = record.clone();
                Box::pin(async move {
                    lock_identity(txn, &record.address, record.created_at).await?;
                    otp_records::Entity::update_many()
                        .col_expr(otp_records::Column::Consumed, Expr::value(true))
                        .filter(otp_records::Column::Address.eq(record.address.as_str()))
                        .filter(otp_records::Column::Consumed.eq(false))
                        .exec(txn)
                        .await?;
                    insert_record(txn, &record).await?;
                    Ok(())
                })
            })
            .await
            .context("replace active otp record")?;
        Ok(())
    }

    async fn find_unconsumed(
        &self,
        address: &EmailAddress,
    ) -> Result<Option<OtpRecord>, VerifierError> {
        let model = otp_records::Entity::find()
            .filter(otp_records::Column::Address.eq(address.as_str()))
            .filter(otp_records::Column::Consumed.eq(false))
            .order_by_desc(otp_records::Column::CreatedAt)
            .one(&self.db)
            .await
            .context("find unconsumed otp record")?;
        Ok(model.map(record_from_model))
    }

    async fn consume(&self, record: &OtpRecord, now: DateTime<Utc>) -> Result<bool, VerifierError> {
        let consumed = self
            .db
            .transaction::<_, bool, DbErr>(|txn| {
                let record = record.clone();
                Box::pin(async move {
                    lock_identity(txn, &record.address, now).await?;
                    let result = otp_records::Entity::update_many()
                        .col_expr(otp_records::Column::Consumed, Expr::value(true))
                        .filter(otp_records::Column::Id.eq(record.id))
                        .filter(otp_records::Column::Consumed.eq(false))
                        .exec(txn)
                        .await?;
                    if result.rows_affected == 0 {
                        return Ok(false);
                    }
                    set_verified(txn, &record.address).await?;
                    Ok(true)
                })
            })
            .await
            .context("consume otp record")?;
        Ok(consumed)
    }

    async fn purge_expired(&self, before: DateTime<Utc>) -> Result<u64, VerifierError> {
        let result = otp_records::Entity::delete_many()
            .filter(otp_records::Column::ExpiresAt.lt(before))
            .exec(&self.db)
            .await
            .context("purge expired otp records")?;
        Ok(result.rows_affected)
    }
}

// ── Identity store ───────────────────────────────────────────────────────────

impl IdentityRepository for DbStore {
    async fn find(&self, address: &EmailAddress) -> Result<Option<Identity>, VerifierError> {
        let model = identities::Entity::find_by_id(address.as_str().to_owned())
            .one(&self.db)
            .await
            .context("find identity")?;
        Ok(model.map(identity_from_model))
    }

    async fn get_or_create(
        &self,
        address: &EmailAddress,
        now: DateTime<Utc>,
    ) -> Result<Identity, VerifierError> {
        let model = self
            .db
            .transaction::<_, identities::Model, DbErr>(|txn| {
                let address = address.clone();
                Box::pin(async move { lock_identity(txn, &address, now).await })
            })
            .await
            .context("get or create identity")?;
        Ok(identity_from_model(model))
    }

    async fn mark_verified(
        &self,
        address: &EmailAddress,
        now: DateTime<Utc>,
    ) -> Result<(), VerifierError> {
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                let address = address.clone();
                Box::pin(async move {
                    lock_identity(txn, &address, now).await?;
                    set_verified(txn, &address).await
                })
            })
            .await
            .context("mark identity verified")?;
        Ok(())
    }
}

// ── Transaction helpers ──────────────────────────────────────────────────────

/// Create the identity row if absent, then take a row lock on it
/// (`SELECT … FOR UPDATE`) held until the transaction ends.
async fn lock_identity(
    txn: &DatabaseTransaction,
    address: &EmailAddress,
    now: DateTime<Utc>,
) -> Result<identities::Model, DbErr> {
    identities::Entity::insert(identities::ActiveModel {
        address: Set(address.as_str().to_owned()),
        verified: Set(false),
        created_at: Set(now),
    })
    .on_conflict(
        OnConflict::column(identities::Column::Address)
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(txn)
    .await?;

    identities::Entity::find_by_id(address.as_str().to_owned())
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("identity {address}")))
}

async fn set_verified(txn: &DatabaseTransaction, address: &EmailAddress) -> Result<(), DbErr> {
    identities::Entity::update_many()
        .col_expr(identities::Column::Verified, Expr::value(true))
        .filter(identities::Column::Address.eq(address.as_str()))
        .exec(txn)
        .await?;
    Ok(())
}

async fn insert_record(txn: &DatabaseTransaction, record: &OtpRecord) -> Result<(), DbErr> {
    otp_records::ActiveModel {
        id: Set(record.id),
        address: Set(record.address.as_str().to_owned()),
        code: Set(record.code.as_str().to_owned()),
        expires_at: Set(record.expires_at),
        consumed: Set(record.consumed),
        created_at: Set(record.created_at),
    }
    .insert(txn)
    .await?;
    Ok(())
}

fn record_from_model(model: otp_records::Model) -> OtpRecord {
    OtpRecord {
        id: model.id,
        address: EmailAddress::from_stored(model.address),
        code: OtpCode::from_stored(model.code),
        expires_at: model.expires_at,
        consumed: model.consumed,
        created_at: model.created_at,
    }
}

fn identity_from_model(model: identities::Model) -> Identity {
    Identity {
        address: EmailAddress::from_stored(model.address),
        verified: model.verified,
        created_at: model.created_at,
    }
}
