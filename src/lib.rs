//! # Lazy, channel-backed stream combinators
//!
//! This crate provides iterator-style combinators over asynchronous streams.
//! Every stream is fed by its own Tokio task, so a pipeline of combinators is
//! a chain of small concurrent stages connected by bounded channels.
//! Nothing is computed ahead of demand beyond the channel capacity.
//!
//! ## Core Concepts
//!
//! - **Source**: produces a sequence with no upstream (`stream!`, `count`, `repeat`)
//! - **Transform**: reads one upstream and emits a derived sequence (`map`, `filter`, `slice`, ...)
//! - **Combinator**: reads several upstreams (`chain`, `zip`, `multi_map`, ...)
//! - **Tee**: splits one stream into independent copies
//! - **Sink**: drains a stream to a final value (`list`, `reduce`, `every`, `some`)
//!
//! ## Example
//!
//! ```rust
//! use lazyweld::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let squares = count(1)
//!         .map(|x, _, _| x * x)
//!         .filter(|x, _, _| x % 2 == 1)
//!         .slice((0, 4))
//!         .list()
//!         .await;
//!     assert_eq!(squares, vec![1, 9, 25, 49]);
//!
//!     let has_big = stream![3, 40, 5].some(|x, _, _| *x > 10).await?;
//!     assert!(has_big);
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod dispatcher;
pub mod processors;
pub mod sinks;
pub mod sources;
pub mod util;
pub mod value;

// Re-export commonly used items
pub mod prelude {
    pub use crate::core::{Error, Result, Scope, Stream, StreamConfig, StreamHandle};
    pub use crate::processors::combinators::{
        chain, multi_map, multi_map_longest, zip, zip2, zip_longest,
    };
    pub use crate::processors::{SliceBounds, StarArgs};
    pub use crate::sinks::{Control, Sink, Verdict};
    pub use crate::sources::{count, from_iter, from_stream, from_vec, repeat, values};
    pub use crate::stream;
    pub use crate::value::Value;
}

// Re-export main error type
pub use crate::core::{Error, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
