pub(crate) mod bootstrap;
pub(crate) mod commands;
pub(crate) mod content;
pub(crate) mod loop_runner;
pub(crate) mod render;
pub(crate) mod session;

#[cfg(test)]
mod tests;
