//! Administrator registration, login and bearer-token access control.
//!
//! Flow Overview:
//! 1) `POST /register` hashes the password and stores a new administrator.
//! 2) `POST /login` verifies the password and issues a signed bearer token
//!    whose subject is the username.
//! 3) Protected handlers call [`principal::require_admin`], which verifies the
//!    token and resolves the subject back to a stored administrator.

pub mod login;
pub mod principal;
pub mod register;
pub mod service;
pub mod state;
pub mod types;

pub use principal::{Principal, require_admin};
pub use state::{AuthConfig, AuthState};

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;
const PASSWORD_MIN: usize = 6;
