//! Codec for the registry-export text format Wine uses as its persistent
//! configuration store (`user.reg`, `system.reg`).
//!
//! The format is line-oriented: two verbatim header lines, an `#arch=`
//! directive, then node blocks of the form
//!
//! ```text
//! [Software\\Wine\\DllOverrides] 1757166416
//! "d3d11"="native"
//! @="default value"
//! ```
//!
//! The parser is permissive by default — real-world hives contain incidental
//! garbage lines, which are skipped — with a strict mode for test fixtures
//! that must assert full-coverage parsing. Serialization is deterministic:
//! nodes and values are emitted in sorted order so re-serializing an
//! unchanged hive is byte-reproducible.

mod model;
mod parser;
mod writer;

pub use model::{DEFAULT_ARCH, DELETE_SENTINEL, NONE_SENTINEL, RegistryHive, RegistryNode, quote};
pub use parser::{ParseMode, load_hive, parse_hive};
pub use writer::{save_hive, serialize_hive};
