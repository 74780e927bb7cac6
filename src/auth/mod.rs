// Authentication module
// OAuth2 grants against the accounts service and the server-side token cache

mod grants;
mod manager;
mod types;

pub use grants::request_token;
pub use manager::CredentialCache;
pub use types::{token_prefix, CachedCredential, Grant};
