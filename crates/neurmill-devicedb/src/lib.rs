pub mod catalog;
pub mod error;
pub mod model;
pub mod traits;

pub use catalog::{init_standard_catalog, MachineCatalog};
pub use error::{DeviceError, DeviceResult, ProfileError, ProfileResult};
pub use model::{MachineProfile, MachineType};
pub use traits::MachineProvider;
