pub mod dispatcher;
pub mod extract;
pub mod pipeline;
pub mod stager;
pub mod storage;
pub mod transfer;
