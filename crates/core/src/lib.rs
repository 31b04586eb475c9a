/*!
This crate contains the indexing and matching core of covcheck.

Checks and exclusions parsed from directive files are stored in a family of
prefix trees keyed by scope kind and hierarchical path. Coverage records
streamed from a database are translated into canonical lookup keys by a
per-vendor path builder and matched against the index in constant depth.
After the stream ends the index is traversed read-only to produce a report.

Usually you will only need the covcheck CLI instead of this crate. But if
you want to drive the index from your own database adapter, this is the
right place.
*/

pub mod path;
pub mod record;
pub mod report;
pub mod walker;

mod node_info;
mod top_tree;
mod trie;

pub use node_info::{ItemKind, NodeInfo};
pub use record::{CoverKind, CoverRecord, DbEvent, DbVendor};
pub use report::{default_checker, Reporter, TreeKind, CLASS_DEFAULT, CLASS_FAIL, CLASS_MISSING};
pub use top_tree::{ScopeKind, SelectSet, TopTree};
pub use trie::ExclTree;
pub use walker::Walker;
