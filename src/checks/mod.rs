//! The checks shipped with this crate
//!
//! Each one is used by the binary of the same name in `src/bin`.

pub mod disk;
pub mod mailqueue;

pub use self::disk::DiskCheck;
pub use self::mailqueue::MailQueueCheck;
