pub(crate) mod avatars;
pub(crate) mod download;
pub(crate) mod error;
pub(crate) mod instagram;
pub(crate) mod profiles;
pub(crate) mod proxy;

pub(crate) use error::ApiError;
