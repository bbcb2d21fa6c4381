//! Admin accounts: credential exchange, session registry, and signup.

pub mod provider;
pub mod router;
pub mod session;
pub mod signup;

pub use provider::{
    AuthError, AuthProvider, AuthUser, DirectoryAuthProvider, SIGN_IN_FAILED_MESSAGE,
};
pub use router::{auth_router, AuthState};
pub use session::{AdminSession, SessionRegistry, SESSION_TOKEN_HEADER};
pub use signup::{
    admin_path, register, AccountStatus, AdminProfile, AdminRole, Department, RegistrationError,
    SignupError, SignupForm,
};
