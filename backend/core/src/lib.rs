pub mod deadline;
pub mod error;
pub mod traits;
pub mod types;

pub use deadline::with_deadline;
pub use error::ScribeError;
pub use traits::{LanguageModel, OcrEngine, VideoDecoder};
pub use types::{BoundingBox, Sender, TextSpan, Turn};
