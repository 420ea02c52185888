//! Record-batch drivers built on the codec.

pub mod batch;
pub mod decode;
pub mod encode;
