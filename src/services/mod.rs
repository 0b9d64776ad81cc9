pub mod locations;
pub mod place_icons;
pub mod slug;

pub use locations::{LocationDirectory, LocationError, LocationService};
pub use place_icons::{IconCatalog, NearbyPlace};
