//! Build-time descriptor table and fake cloud backend.
//!
//! Where a typed SDK client could be walked with runtime reflection, this
//! crate hard-codes the same information ahead of time: [`descriptor::all`]
//! returns one [`octl_types::Operation`] per API call the rest of the
//! pipeline can address, and [`fake_cloud::FakeCloud`] gives those calls
//! somewhere to go without a network.

pub mod descriptor;
pub mod error;
pub mod fake_cloud;

pub use descriptor::{all, by_name};
pub use error::{Error, Result};
pub use fake_cloud::FakeCloud;
