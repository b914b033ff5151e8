pub mod audio;
pub mod error;
pub mod gameplay;
pub mod input;
pub mod store;
pub mod time;
pub mod trainer;

pub use error::{DojoError, DojoResult};
