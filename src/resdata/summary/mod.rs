//! Summary catalogs and time series.
//!
//! A summary case is a catalog file (`SMSPEC`) describing every variable,
//! and one or more data files holding the values:
//!
//! ```text
//! SummaryIndex (SMSPEC)             SummaryData (UNSMRY / Snnnn)
//! ┌──────────┬──────────────┐       ministep 0: [v0, v1, ... vn-1]
//! │ position │ key          │       ministep 1: [v0, v1, ... vn-1]
//! ├──────────┼──────────────┤       ...
//! │ 0        │ TIME         │               │
//! │ 1        │ FOPR         │               └─ column `position` = one vector
//! │ 2        │ WOPR:OP_1    │
//! └──────────┴──────────────┘
//! ```

mod data;
mod node;
mod smspec;

pub use data::SummaryData;
pub use node::{SummaryNode, SummaryOptions, VarType, DUMMY_WELL};
pub use smspec::SummaryIndex;
