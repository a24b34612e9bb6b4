pub mod StructDebug;
mod impls;
