mod provider_signature;

pub use provider_signature::{sign_confirmation, PaymentConfirmation, SignatureError};
