//! Types from the `hdmf-common` namespace.

mod container;
mod data;
mod dynamic_table;
mod dynamic_table_region;
mod element_identifiers;
mod vector_data;

pub use container::Container;
pub(crate) use container::typed_children;
pub use data::Data;
pub use dynamic_table::DynamicTable;
pub use dynamic_table_region::DynamicTableRegion;
pub use element_identifiers::ElementIdentifiers;
pub use vector_data::VectorData;
