//! Generation Layer
//!
//! Credentials, prompt construction and the generation API client.

pub mod credentials;
pub mod prompt;
pub mod provider;
pub mod timeout;

pub use credentials::{Credential, CredentialRotator, Exhausted};
pub use prompt::{RequestBuilder, RequestPayload, render_prompt};
pub use provider::{
    GeminiClient, GenerationClient, GenerationOutcome, SharedClient, classify_response,
    create_client,
};
pub use timeout::with_timeout;
