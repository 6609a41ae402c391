pub mod cost;
pub mod dispatcher;
pub mod generator;
pub mod lead_source;
pub mod pipeline;
pub mod table;

pub use crate::domain::model::{
    CompletionRequest, CostEstimate, DispatchFailure, DispatchMode, GeneratedMessage,
    GenerationOutcome, Lead, OtherCosts, OutgoingEmail, SendRecord, SendStatus,
};
pub use crate::domain::ports::{LeadSource, MailTransport, Storage, TextGenerator};
pub use crate::utils::error::Result;
