//! # agent-core
//!
//! Bounded think/act/observe agent over a provider-agnostic LLM abstraction.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Agent                               │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐   │
//! │  │  Reasoning  │──│    Tool     │  │    LlmProvider      │   │
//! │  │    Loop     │  │  Registry   │  │    (Strategy)       │   │
//! │  └──────┬──────┘  └─────────────┘  └─────────────────────┘   │
//! │         │                                                    │
//! │  ┌──────┴──────┐  ┌─────────────┐  ┌─────────────────────┐   │
//! │  │   Memory    │  │   Prompt    │  │   Action schema     │   │
//! │  │   Window    │  │  Renderer   │  │   (name + args)     │   │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every step the model answers with `{"name": ..., "args": {...}}`. A tool
//! name is dispatched through the registry and the observation is folded into
//! memory; the reserved name `FINISH` ends the loop and triggers one final,
//! free-form synthesis call.

pub mod action;
pub mod error;
pub mod memory;
pub mod message;
pub mod prompt;
pub mod provider;
pub mod reasoning;
pub mod tool;

pub use action::{Action, FINISH};
pub use error::{AgentError, Result};
pub use memory::{CharEstimate, MemoryWindow, TokenCounter, Turn};
pub use message::{Message, Role};
pub use prompt::PromptTemplate;
pub use provider::{GenerationOptions, LlmProvider};
pub use reasoning::{Agent, AgentBuilder, AgentConfig, RunResult, StepObserver, TracingObserver};
pub use tool::{ParameterSchema, Tool, ToolRegistry, ToolResult, ToolSchema};
