pub mod bar;
pub mod normalize;

pub use bar::{Bar, VolumePoint};
pub use normalize::{
    ColumnIndexMap, FieldKeyOverrides, MS_EPOCH_THRESHOLD, NormalizerConfig, normalize_row,
    normalize_rows,
};
