//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod chat_repo;
pub mod comic_repo;
pub mod device_repo;
pub mod employee_repo;
pub mod job_repo;
pub mod notification_mark_repo;
pub mod user_repo;
pub mod watermark_repo;

pub use chat_repo::ChatRepo;
pub use comic_repo::ComicRepo;
pub use device_repo::DeviceRepo;
pub use employee_repo::EmployeeRepo;
pub use job_repo::JobRepo;
pub use notification_mark_repo::NotificationMarkRepo;
pub use user_repo::UserRepo;
pub use watermark_repo::WatermarkRepo;
