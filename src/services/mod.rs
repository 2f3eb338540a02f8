pub mod ocr;
pub use ocr::*;

pub mod acquisition;
pub mod clipboard;
pub mod export;
pub mod preview;
pub mod session;
pub mod store;
pub mod text;

pub use acquisition::{acquire, acquire_path, AcquisitionError};
pub use preview::{ObjectUrl, ObjectUrlRegistry};
pub use session::{Event, Session, SessionError};
pub use store::SessionStore;
pub use text::{TextStats, TextTransform};
