/// Main configuration module.
///
/// Re-exports submodules for room rules and server/process settings.
pub mod room;
pub mod server;
