//! Question-solving pipeline: routing, solving, validation, normalization

pub mod arithmetic;
pub mod context;
pub mod machine;
pub mod normalizer;

pub use arithmetic::ArithmeticShortcut;
pub use context::RoutingContext;
pub use machine::MathAgent;
pub use normalizer::SolutionNormalizer;
