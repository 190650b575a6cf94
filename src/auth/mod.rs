pub mod api_key;
pub mod session;
pub mod users;

pub use api_key::ApiKey;
pub use session::{Session, SessionStore};
