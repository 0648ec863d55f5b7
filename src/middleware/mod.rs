mod http_metrics;
mod request_id;
mod session;
mod timeout;

pub use http_metrics::http_metrics_middleware;
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
pub use session::session_auth_middleware;
pub use timeout::timeout_middleware;
