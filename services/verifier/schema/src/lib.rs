pub mod identities;
pub mod otp_records;
