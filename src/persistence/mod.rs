mod api;
mod disk;
#[cfg(test)]
mod in_memory;
mod key_codec;

pub(crate) use api::DatumPersistence;
pub(crate) use api::PersistenceError;
pub(crate) use disk::FileDatumPersistence;
#[cfg(test)]
pub(crate) use in_memory::InMemoryPersistence;
