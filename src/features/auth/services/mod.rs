pub mod auth_service;
pub mod password;
pub mod session_service;
pub mod token_service;

pub use auth_service::AuthService;
pub use session_service::SessionService;
pub use token_service::TokenService;
