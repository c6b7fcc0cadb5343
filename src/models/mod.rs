pub mod branch;
pub mod metadata;
pub mod query;
pub mod session;
pub mod submission;

pub use branch::*;
pub use metadata::*;
pub use query::*;
pub use session::*;
pub use submission::*;
