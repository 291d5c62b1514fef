pub mod body_limit;
pub mod panic;
pub mod request_id;

pub use body_limit::body_limit_middleware;
pub use panic::panic_response;
pub use request_id::request_id_middleware;
