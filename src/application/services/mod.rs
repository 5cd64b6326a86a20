//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem, SourceParser)
//! but are themselves concrete structs, not traits.

mod dispatcher;
mod reader;
mod scanner;
mod session;

pub use dispatcher::EventDispatcher;
pub use reader::StructureReader;
pub use scanner::ProjectScanner;
pub use session::Session;
