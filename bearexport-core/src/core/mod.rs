//! Internal domain modules for the Bear Export core library.
//!
//! All public types from these modules are re-exported at the crate root
//! with `#[doc(inline)]`; import from there in preference to this module.

pub mod access;
pub mod attachment;
pub mod error;
pub mod export;
pub mod note;
pub mod run;
pub mod storage;
