pub mod catalog;
pub mod cleaning;
pub mod providers;
pub mod recommendations;

pub use catalog::Catalog;
pub use providers::{jikan::JikanProvider, AnimeInfoProvider};
pub use recommendations::{RecommendationEngine, RecommendationSession, SessionSettings};
