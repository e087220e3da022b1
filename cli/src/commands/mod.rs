mod inspect;
mod method_id;

pub use inspect::*;
pub use method_id::*;
