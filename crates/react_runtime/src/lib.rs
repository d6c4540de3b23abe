//! # ReAct runtime
//!
//! Reference implementation of the reason-and-act loop that converted programs run.
//! The protocol constants in [`protocol`] are the single source for both this loop
//! and the Python runtime emitted by the code synthesizer.

pub mod client;
pub mod protocol;
pub mod runtime;
pub mod state;
pub mod template;
pub mod tools;

pub use client::{ChatMessage, ClientConfig, InferenceClient, OpenAiCompatClient, Role};
pub use protocol::{AgentStep, parse_response};
pub use runtime::{ReactRuntime, RunReport, RuntimeError, Termination};
pub use state::AgentState;
pub use template::{RenderError, render_template, template_fields};
pub use tools::{ToolArguments, ToolRegistry};
