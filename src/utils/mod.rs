pub mod perf;

pub use perf::{ExchangeTimings, Stopwatch};
