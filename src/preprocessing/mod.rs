//! Feature preprocessing
//!
//! Column-role based transformation pipeline:
//! - Numeric columns: median imputation followed by standardization
//! - Categorical columns: most-frequent imputation followed by one-hot
//!   encoding (unseen categories encode as all-zero)
//! - One ordinal column: rank encoding with a caller-declared category
//!   order (unseen categories fail loudly)
//! - Dropped columns are removed; unlisted columns pass through
//!
//! All fitted state comes from the training split only.

mod encoder;
mod imputer;
mod pipeline;
mod scaler;

pub use encoder::{OneHotEncoder, OrdinalEncoder};
pub use imputer::{ImputeStrategy, Imputer};
pub use pipeline::{ColumnRoles, FeaturePipeline, OrdinalSpec, PipelineConstructor};
pub use scaler::StandardScaler;
