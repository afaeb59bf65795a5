pub mod analysis;
pub mod container;
pub mod error;
pub mod frame;
pub mod settings;

pub use analysis::{GroupedAnswers, cross_tabulate, filter_and_group};
pub use container::{
    ContainerState, DataContainer, IngestReport, MetadataReport, SkippedCell, SkippedRow,
};
pub use error::{ContainerError, Result};
pub use frame::{
    AsDataFrame, ColumnNames, ID_COLUMN, answers_frame, named_answers_frame, value_counts_frame,
};
pub use settings::{CoercionPolicy, DuplicatePolicy, Settings};
