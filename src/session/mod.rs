// Session Manager (C2, §4.2).

pub mod manager;
pub mod model;

pub use manager::SessionManager;
pub use model::{Session, SessionMode};
