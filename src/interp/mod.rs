//! Evaluator: runtime values, call frames, the output sink and the
//! tree-walking interpreter

pub mod env;
pub mod eval;
pub mod sink;
pub mod value;

pub use env::{Frame, Receiver};
pub use eval::{Flow, Interpreter};
pub use sink::{CaptureSink, OutputSink, StdoutSink};
pub use value::{StructValue, Value, VariantTag, VariantValue};
