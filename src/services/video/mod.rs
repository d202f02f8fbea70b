// Video services
// Stock footage search and download

pub mod pexels;

pub use pexels::{PexelsClient, fetch_video_from_pexels};
