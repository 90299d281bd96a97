//! Preconditions checked before a command may touch guild or voice state.
//!
//! A command registers a [`RuleSet`] once.  Each invocation is snapshotted into an
//! [`Invocation`] and run through the [`Validator`], which evaluates the rules in a fixed order
//! (admin, guild, argument count, argument format, channel mention, voice channel name) and
//! reports only the first failure.

mod argument;
mod invocation;
mod rule;
mod validator;

pub use argument::ArgumentFormat;
pub use invocation::{Invocation, Origin};
pub use rule::{ArgCount, RuleSet, ValidationRule};
pub use validator::{AdminList, Validator};
