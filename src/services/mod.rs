pub mod auth_service;
pub mod email_service;
pub mod transaction_service;
pub mod wallet_service;

pub use email_service::*;
pub use transaction_service::*;
pub use wallet_service::*;
