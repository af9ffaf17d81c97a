//! Handler conveniences: typed depot access and error mapping.

mod depot;
mod result;

pub(crate) use depot::DepotExt as _;
pub(crate) use result::ResultExt as _;
