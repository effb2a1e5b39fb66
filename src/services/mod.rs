pub mod activity_service;
pub mod catalog_service;
pub mod child_service;
pub mod error;
pub mod profile_service;
pub mod quiz_service;

pub use activity_service::ActivityService;
pub use catalog_service::CatalogService;
pub use child_service::ChildService;
pub use error::ServiceError;
pub use profile_service::ProfileService;
pub use quiz_service::QuizService;

use crate::policy::Viewer;

/// Signed-in user id, or Unauthorized
pub fn require_user(viewer: &Viewer) -> Result<&str, ServiceError> {
    viewer.user_id.as_deref().ok_or(ServiceError::Unauthorized)
}
