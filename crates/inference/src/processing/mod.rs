pub mod decode;
pub mod mapping;
pub mod nms;

pub use decode::{DecodeError, TensorDecoder};
pub use mapping::{ScreenMapping, map_box};
pub use nms::suppress;
