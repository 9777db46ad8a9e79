pub mod models;
pub mod pii;

pub use models::events::DeskEvent;
pub use pii::Masked;
