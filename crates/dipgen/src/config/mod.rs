pub mod loader;
pub mod mime;
pub mod schema;

pub use loader::{load_config, load_config_from_str, resolve_object_type};
pub use mime::{canonical_mime, MimeAllowList};
pub use schema::{DerivativeSizes, ObjectType, PackageConfig, QueueLayout};
