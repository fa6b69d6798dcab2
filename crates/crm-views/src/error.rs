use crm_client::ClientError;

use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum ViewsError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
