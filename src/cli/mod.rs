mod args;
mod invocation;

pub use args::Args;
pub use invocation::Invocation;
