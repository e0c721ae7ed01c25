pub mod request;
pub mod response;
pub mod service;

pub use request::{parse_cookies, CrudRequest, RequestId};
pub use response::{HeaderVec, Response};
pub use service::AppService;
