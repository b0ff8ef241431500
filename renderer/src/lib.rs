pub mod bridge;
pub mod error;
pub mod evaluator;
pub mod extract;
pub mod functions;
pub mod memory;
pub mod render;
pub mod scope;
pub mod tree;
pub mod value;

pub use bridge::{HostValue, RenderResult, render, render_host_values};
pub use error::{Diagnostic, DiagnosticKind, EvalError, RenderError};
pub use memory::{MemoryTree, NodeId};
pub use scope::Scope;
pub use tree::{Property, TargetTree, TreeError};
pub use value::Value;
