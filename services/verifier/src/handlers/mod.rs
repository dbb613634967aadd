pub mod info;
pub mod otp;
