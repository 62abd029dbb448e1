#![deny(rust_2018_idioms)]
#![deny(clippy::all)]

pub mod ad;
pub mod display;
pub mod targeting;
pub mod util {
    pub mod logging;
    pub mod serde;
}

pub use self::ad::{Advertisement, Condition, Country, CreateAd, Gender, IntakeError, Platform};
pub use self::display::{AdItem, DisplayAds, Pagination};
pub use self::targeting::{AdQuery, Input, InvalidParameter};
