//! Ground marker board model and corner identification.
//!
//! The board carries twenty known corners: sixteen on a 4x4 grid of colored
//! squares and four yellow ones. Detected corners are identified without any
//! pose prior by looking up quantized pair signatures in two precomputed
//! tables and letting every pair vote.
//!
//! ```
//! use groundmark_board::{identify, IdentifyParams, IdentityTables};
//! use groundmark_core::ColorCorners;
//!
//! let corners = ColorCorners::new();
//! let ids = identify(&corners, IdentityTables::shared(), &IdentifyParams::default());
//! assert_eq!(ids.resolved_count(), 0);
//! ```

mod identify;
mod layout;
mod signature;
mod tables;

pub use identify::{identify, min_yellow_distance, IdentifyParams, Identification, VoteTally};
pub use layout::{color_ids, BoardLayout, BoardLayoutError, VertexId};
pub use signature::{angle_class, sign_class, DOT_CROSS_EPS};
pub use tables::{format_grid_key, format_yellow_key, IdentityTables, VertexPair};
