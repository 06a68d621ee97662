pub mod bundle;
pub mod container;
pub mod crypto;
pub mod error;
pub mod kdf;
pub mod pipeline;
pub mod transform;
pub mod validate;

pub use bundle::KeyBundle;
pub use error::{Error, Result};
pub use pipeline::{Decrypted, Decryptor, Encryptor};
pub use validate::FileType;
