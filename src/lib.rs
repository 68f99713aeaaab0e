pub mod cache;
pub mod config;
pub mod dispatch;
pub mod exception;
pub mod handlers;
pub mod loader;
pub mod modules;
pub mod param;
pub mod request;
pub mod resolver;
pub mod response;
pub mod server;
pub mod util;

pub use cache::FileCache;
pub use config::{Config, ModuleEntry};
pub use dispatch::{DispatchState, Dispatcher, Handler};
pub use exception::Exception;
pub use handlers::{MediaHandler, NotFoundHandler, PageHandler};
pub use loader::{ClassLoader, ClassName};
pub use modules::{Module, ModuleRegistry};
pub use param::{HttpEncoding, HttpRequestMethod};
pub use request::Request;
pub use resolver::{ResolvedFile, Resolver, SearchPath};
pub use response::{HeaderQueue, HeaderSink, Response};
pub use util::HtmlBuilder;
