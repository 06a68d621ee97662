pub mod aes;
pub mod chacha;
pub mod lzma;
pub mod rsa;
