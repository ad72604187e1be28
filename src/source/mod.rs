pub mod encoding;
pub mod locate;

pub use encoding::{detect_encoding, read_to_string, SourceEncoding};
pub use locate::{locate_source, Located};
