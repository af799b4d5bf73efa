//! Batch translator for Ren'Py scripts.
//!
//! Quoted dialogue is pulled out of every `.rpy` file under a folder, strings
//! the translation memory does not know yet are sent to a translation service
//! in chunks (with `[variables]` and `{tags}` masked out), and translated
//! copies of the scripts are written next to a backup of the originals.

pub mod error;
pub mod model;
pub mod parsers;
pub mod protocol;
pub mod services;
