mod handlers;
mod routes;
mod state;

pub use handlers::{CurrentItem, SessionView, TitleResponse};
pub use routes::create_router;
pub use state::AppState;
