pub mod console_handler;
pub mod drainer;
pub mod file_handler;
pub mod handler_trait;
pub mod registry;

pub use console_handler::ConsoleHandler;
pub use drainer::{DrainReport, EventDrainer};
pub use file_handler::FileHandler;
pub use handler_trait::{format_line, ResultHandler};
pub use registry::HandlerRegistry;
