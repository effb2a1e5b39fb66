pub mod response;
pub mod session;

pub use response::{json_body, ApiResponse, ApiResult};
pub use session::{active_child_cookie, cookie_value, locale_cookie, session_user};
