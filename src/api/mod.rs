//! API Module
//!
//! Prompt types and generate-content wire types.

pub mod content;

pub use content::{
    Candidate, CandidateContent, GenerateContentRequest, GenerateContentResponse, InlineData, Part,
    Prompt, PromptPart, RequestContent,
};
