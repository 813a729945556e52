pub mod conversion;
pub mod request;
pub mod response;

pub use conversion::*;
pub use request::*;
pub use response::*;
