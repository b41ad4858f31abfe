//! # steiner-core: Battery-Aware Steiner Tree Data Model
//!
//! Provides the fundamental data structures for the multi-temporal,
//! battery-aware Steiner tree optimizer: terminals, candidate Full Steiner
//! Tree (FST) hyperedges, and the edge map aggregated across them.
//!
//! ## Design Philosophy
//!
//! The instance is loaded once into an immutable [`Hypergraph`]:
//! - **Terminals**: demand points with planar coordinates and a battery level
//! - **FSTs**: precomputed candidate hyperedges (locally Steiner-optimal
//!   trees over terminal subsets), each carrying its own geometric edges
//! - **EdgeMap**: the de-duplicated union of every FST's geometric edges
//!
//! Nothing in this crate performs branch-and-cut or LP construction — see
//! `steiner-algo` for that. This crate only owns the data that both the
//! algorithm and the CLI need to agree on.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use steiner_core::*;
//!
//! let terminals = vec![
//!     Terminal::new(TerminalId::new(0), 0.0, 0.0, 100.0),
//!     Terminal::new(TerminalId::new(1), 10.0, 0.0, 50.0),
//! ];
//! let fst = Fst::new(
//!     FstId::new(0),
//!     vec![TerminalId::new(0), TerminalId::new(1)],
//!     vec![GeometricEdge::new(PointId::new(0), PointId::new(1), 10.0)],
//!     10.0,
//! );
//! let hypergraph = Hypergraph::new(terminals, vec![fst]);
//! assert_eq!(hypergraph.num_fsts(), 1);
//! ```
//!
//! ## ID System
//!
//! Every element has a type-safe newtype id ([`TerminalId`], [`FstId`],
//! [`EdgeId`], [`PointId`]) so a terminal id can never be silently used
//! where an FST id is expected.
//!
//! ## Modules
//!
//! - [`terminal`] - Terminal records
//! - [`fst`] - FST candidate hyperedges and their geometric edges
//! - [`edge_map`] - The de-duplicated union of FST geometric edges
//! - [`hypergraph`] - The immutable instance record, including cost normalization
//! - [`error`] - Unified error type

pub mod edge_map;
pub mod error;
pub mod fst;
pub mod hypergraph;
pub mod ids;
pub mod terminal;

pub use edge_map::{EdgeMap, UniqueEdge};
pub use error::{SteinerError, SteinerResult};
pub use fst::{Fst, GeometricEdge};
pub use hypergraph::Hypergraph;
pub use ids::{EdgeId, FstId, PointId, TerminalId};
pub use terminal::Terminal;
