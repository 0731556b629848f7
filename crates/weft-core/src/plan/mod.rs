//! Build plans: typed actions and the markup parser that extracts them
//! from raw model output.

pub mod action;
pub mod markup;

pub use action::{ActionKind, ActionPath, BuildAction, PathError};
pub use markup::{ParsedPlan, parse_plan};
