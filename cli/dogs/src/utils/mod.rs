pub mod errors;
pub mod init;
pub mod message;
