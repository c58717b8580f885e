pub mod catalog;
pub mod error;
pub mod types;
pub mod user_content;
pub mod user_shows;
pub mod users;

pub use catalog::*;
pub use error::ApiError;
pub use types::*;
pub use user_content::*;
pub use user_shows::*;
pub use users::*;
