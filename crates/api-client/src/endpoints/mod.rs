//! Endpoint-specific API implementations
//!
//! Each module provides a typed interface for a set of backend endpoints.
//!
//! | Module | Backend route | Description |
//! |--------|---------------|-------------|
//! | `composers` | `/composers/` | Composer list representation |
//! | `works` | `/works/` | Public work list representation |
//! | `pagination` | all list routes | Page-number pagination envelope and query parameters |

pub mod composers;
pub mod pagination;
pub mod works;

pub use composers::{ComposerRecord, ComposersApi, Period};
pub use pagination::{ListParams, Page};
pub use works::{ComposerRef, InstrumentationCategory, TagRef, WorkRecord, WorksApi};
