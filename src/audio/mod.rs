pub mod buffer;
pub mod capture;
pub mod source;

pub use buffer::FrameAssembler;
pub use capture::{AudioCapture, list_input_devices};
pub use source::{AudioSource, DeviceSource, WavFileSource};
