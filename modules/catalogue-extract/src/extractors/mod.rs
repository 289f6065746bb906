pub mod edinburgh_council;
pub mod google_places;
pub mod open_charge_map;
pub mod openstreetmap;
pub mod serper;
pub mod sport_scotland;

pub use edinburgh_council::EdinburghCouncilExtractor;
pub use google_places::GooglePlacesExtractor;
pub use open_charge_map::OpenChargeMapExtractor;
pub use openstreetmap::OpenStreetMapExtractor;
pub use serper::SerperExtractor;
pub use sport_scotland::SportScotlandExtractor;
