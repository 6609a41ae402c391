// Adapters layer: concrete implementations of the domain ports
// (local storage, chat-completions client, mail transports).

pub mod mail;
pub mod openai;
pub mod storage;
