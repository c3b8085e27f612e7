//! Batch post-processing for generated message-type corpora: the boxing
//! pass applies heap indirection to deeply nested or recursive fields, the
//! consolidation pass moves duplicated definitions into the shared module.

pub mod boxing;
pub mod consolidate;
pub mod corpus;
