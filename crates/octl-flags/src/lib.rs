//! The Flag Synthesizer: turns a [`octl_types::FieldShape`] tree into a
//! flat list of [`octl_types::Flag`]s, and the time-value custom parser
//! those flags can carry.

pub mod synth;
pub mod time;

pub use synth::{synthesize, synthesize_with_visible_slices};
pub use time::{parse_time_value, system_now, NowFn, TimeParseError};
