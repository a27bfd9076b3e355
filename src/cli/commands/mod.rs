mod command_result;
pub mod init;
pub mod mine;

pub use command_result::*;
