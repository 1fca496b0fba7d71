pub mod config;
pub mod factory;
pub mod humanize;
pub mod navigation;
pub mod observability;
pub mod reader;
pub mod source;
pub mod worker;

pub use factory::LogPointerFactory;
pub use navigation::{Navigation, NavigationError, NavigationFuture, NavigationTarget, Resolution};
pub use source::{LogPointer, LogSource, SourceId};
