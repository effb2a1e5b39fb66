pub mod activity;
pub mod child_profile;
pub mod quiz;
pub mod user;
pub mod video;

pub use activity::{Favorite, ShortViewUpdate, WatchHistory};
pub use child_profile::{ChildProfile, ParentalControls};
pub use quiz::{Quiz, QuizAnswer, QuizAttempt, QuizDefinition, QuizOption, QuizQuestion};
pub use user::{Session, User};
pub use video::{CategoryCount, ContentType, Video};
