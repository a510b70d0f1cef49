pub mod moving_averages;
pub mod tsv;
pub mod utility_functions;

pub use moving_averages::{ma, MaData, MaError, MaType};
pub use tsv::{
    tsv, tsv_batch_par_slice, tsv_batch_slice, tsv_into_slices, SignalOffsetSource, TsvBatchBuilder,
    TsvBatchOutput, TsvBatchRange, TsvBuilder, TsvData, TsvError, TsvInput, TsvOutput, TsvParams,
    TsvTable, VolumeSign,
};
