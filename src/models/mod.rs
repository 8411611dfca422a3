pub mod catalog;
pub mod device;
pub mod event;
pub mod location;
pub mod person;
pub mod rule;
pub mod scenario;
pub mod settings;

pub use catalog::*;
pub use device::*;
pub use event::*;
pub use location::*;
pub use person::*;
pub use rule::*;
pub use scenario::*;
pub use settings::*;
