pub mod device;
pub mod log_record;
pub mod user;
