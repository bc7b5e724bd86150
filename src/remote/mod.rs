//! Remote status document synchronisation.
//!
//! Both nodes coordinate through one JSON document in a remote versioned
//! store (the GitHub contents API): `{"sensor2": <bool>}`, Base64-wrapped
//! inside the API envelope. The AC node writes it ([`publisher`]), the door
//! node reads it ([`oracle`]). There is no locking — last writer wins, and
//! the reader may observe a stale flag for up to its own poll period.

pub mod b64;
pub mod document;
pub mod oracle;
pub mod publisher;
