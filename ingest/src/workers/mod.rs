//! The three pipeline stages: source reader, transform workers, sink writer.
//!
//! Each stage runs on its own OS thread and communicates with its neighbors
//! only through the bounded queues. Shutdown is sentinel based: the reader
//! emits one sentinel per transform worker after the source is exhausted, each
//! worker forwards exactly one, and the writer stops once it has counted them
//! all. There is no mid-run cancellation primitive; a stage that fails closes
//! its adjacent queue so the remaining stages unwind instead of blocking.

pub mod reader;
pub mod transform;
pub mod writer;
