use snowfall::{SnowflakeGenerator, TimeSource};

/// The clock behind the shared generator. Boxed so tests can swap in a
/// controllable clock without changing the handler types.
pub type Clock = Box<dyn TimeSource + Send + Sync>;
pub type Generator = SnowflakeGenerator<Clock>;
