mod fixture;

mod indexing;
mod macros;
mod storage;
