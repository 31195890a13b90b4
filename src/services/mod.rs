//! Services owning the index store and the three subsystems that share
//! it: the explorer (read path), the seeder (bulk bootstrap), and the
//! subscriber (incremental reconciler).

pub mod explore_service;
pub mod index_service;
pub mod seed_service;
pub mod subscribe_service;
