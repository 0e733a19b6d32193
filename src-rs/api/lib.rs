pub mod handlers;
pub mod server;

pub use handlers::{AppState, ClaimRequest, TweetRequest, TweetResponse};
pub use server::{build_router, AppServer};
