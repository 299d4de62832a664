mod chat_stream;
mod timeline;

pub use chat_stream::*;
pub use timeline::*;
