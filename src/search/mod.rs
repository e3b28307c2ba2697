pub mod carousel;
pub mod controller;
pub mod normalize;
pub mod session;

pub use carousel::ImageCarousel;
pub use controller::{GuidedSearch, DEFAULT_CALL_TIMEOUT};
pub use normalize::{extract_images, normalize_listings, ListingPayload, WrapperField};
pub use session::{Call, Dispatch, SearchSession, Stage, Ticket};
