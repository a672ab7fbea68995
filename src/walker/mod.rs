//! The two-phase listener pair driving a compilation: declare first (so
//! forward references and imports resolve), then walk again to build the
//! fully resolved [`crate::document::Document`].

pub mod decl_phase;
pub mod ref_phase;
