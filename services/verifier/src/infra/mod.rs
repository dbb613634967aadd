pub mod db;
pub mod mailgun;
pub mod memory;
pub mod sweeper;
