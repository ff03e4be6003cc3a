pub mod bearer;
pub mod decision;
pub mod delegate;
pub mod factory;
pub mod keys;
pub mod local;
pub mod remote;
pub mod verifier;

pub use decision::{Decision, ValidationService};
pub use delegate::AuthenticationDelegate;
pub use keys::SigningKeySet;
pub use local::LocalVerifier;
pub use remote::RemoteVerifier;
pub use verifier::{TokenVerifier, Verdict, VerifierError};
