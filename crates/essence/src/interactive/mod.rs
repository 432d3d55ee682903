//! Operator-in-the-loop disambiguation and runtime teaching.
//!
//! [`InteractiveResolver`] is the seam the converter calls when an
//! extraction's confidence is below the resolver's threshold. Bindings:
//!
//! - [`ConsoleResolver`]: numbered menus on any reader/writer pair.
//! - [`ChannelResolver`]: each question goes out as a [`Prompt`] message.
//! - [`FirstCandidateResolver`] and [`ScriptedResolver`]: automated.
//!
//! Resolvers only decide. Teaching statements they return are parsed and
//! applied by [`teaching::learn`] through the rule manager.

mod channel;
mod console;
mod resolver;
mod scripted;
pub mod teaching;

pub use channel::{ChannelResolver, Prompt, Question, Reply};
pub use console::ConsoleResolver;
pub use resolver::{Answer, InteractiveContext, InteractiveResolver, DEFAULT_CONFIDENCE_THRESHOLD};
pub use scripted::{AskedQuestion, FirstCandidateResolver, ScriptedResolver};
pub use teaching::{learn, LearningFailure, LearningOutcome, Lesson, TeachingStatement};
