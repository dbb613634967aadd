use sea_orm::entity::prelude::*;

/// Verification state of one email address. Keyed by the normalized
/// (trimmed, lower-cased) address.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "identities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub address: String,
    pub verified: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::otp_records::Entity")]
    OtpRecords,
}

impl Related<super::otp_records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OtpRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
