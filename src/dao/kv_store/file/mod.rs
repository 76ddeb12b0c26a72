mod config;
mod error;
mod store;

pub use config::FileConfig;
pub use error::{FileDaoError, FileResult};
pub use store::FileKvStore;

use crate::dao::storage::BackendError;

impl From<FileDaoError> for BackendError {
    fn from(err: FileDaoError) -> Self {
        BackendError::unavailable(err.to_string(), err)
    }
}
