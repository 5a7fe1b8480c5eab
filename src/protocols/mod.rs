//! Line protocols served by the binary.
//!
//! Both sit on top of the engine's handler contract:
//! - `echo`: repeats each line, stateless
//! - `smtp`: a toy mail dialogue with a multi-line DATA block

pub mod echo;
pub mod smtp;
