mod build;
mod gc;
mod init;
mod status;
mod verify;

pub use build::cmd_build;
pub use gc::cmd_gc;
pub use init::cmd_init;
pub use status::cmd_status;
pub use verify::cmd_verify;
