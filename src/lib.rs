//! `timp_verify` is a small collection of demo binaries over the
//! `timp_core` verification engine; it has no library surface of its own.
