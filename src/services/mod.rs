pub mod history;
pub mod imagegen;
pub mod llm;
pub mod narrator;
pub mod voice;
pub mod workflow;
