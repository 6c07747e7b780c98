pub(crate) mod convert;
mod intake;
mod server;
mod subscription;

pub use convert::ProtoConvertError;
pub(crate) use server::RpcServer;
