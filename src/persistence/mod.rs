pub mod layout;

pub use layout::{
    LayoutError, LayoutMetadata, LayoutRecord, layout_from_store, list_layouts, load_layout,
    parse_layout, records_to_tiles, save_layout,
};
