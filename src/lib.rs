pub mod console;
pub mod logging;
pub mod platform;
pub mod speech;
