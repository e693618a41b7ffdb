//! Scenario document analysis
//!
//! Given the text of a `*.crank.yml` file and a cursor line, works out which
//! registry step the enclosing `steps` item refers to, which cog is active and
//! which tokens earlier steps have made available.

pub mod buffer;
pub mod line_walk;
pub mod resolver;
pub mod step;
pub mod structure;
pub mod tokens;

pub use buffer::{TextBuffer, TextLine, closest_less_indented_line};
pub use line_walk::{WalkedStep, walk_step_at};
pub use resolver::{ContextResolver, StepOccurrence};
pub use step::StepObject;
pub use structure::{LineRange, StepItem, scan_steps};
pub use tokens::{TokenOrigin, TokenTable, cog_short_name, record_token_keys};
