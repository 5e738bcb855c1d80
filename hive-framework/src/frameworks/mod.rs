//! Built-in framework implementations

mod echo;

pub use echo::EchoFramework;
