pub mod manager;
pub mod models;
pub mod pg_store;
pub mod repository;
pub mod store;
pub mod video_query;

pub use manager::{DatabaseError, DatabaseManager};
pub use pg_store::PgStore;
pub use store::{ActivityStore, ChildProfileStore, QuizStore, SessionStore, Store, VideoStore};
pub use video_query::{VideoCriterion, VideoOrder, VideoQuery};
