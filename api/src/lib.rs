pub mod admin;
pub mod app;
pub mod dispatch;
pub mod ecs;
pub mod elbv2;
pub mod error;
pub mod logs;
pub mod proxy;
pub mod server;
pub mod service_discovery;

pub use app::AppContext;
pub use error::{ApiError, ApiResult};
