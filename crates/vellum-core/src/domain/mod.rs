//! Domain model (IDs, stored objects, errors).

pub mod errors;
pub mod ids;
pub mod object;

pub use self::errors::{ErrorKind, ResponseClass, StorageCause, StorageStage, StoreError};
pub use self::ids::{InternalId, PublicId};
pub use self::object::{NewObject, ObjectMeta, StoredObject};
