//! Outbound HTTP collaborators: postal-code autofill, the e-mail relay, and the chat assistant.

pub mod address;
pub mod assistant;
pub mod notify;

pub use address::{Address, AddressError, AddressLookup, PostalCode, ViaCepClient};
pub use assistant::{Assistant, AssistantError, GeminiAssistant, FALLBACK_ANSWER};
pub use notify::MailRelayNotifier;
