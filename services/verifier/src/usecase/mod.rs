pub mod issue;
pub mod purge;
pub mod status;
pub mod verify;
