/*
[INPUT]:  Raw XML bodies and presentation documents
[OUTPUT]: Decoded API values and encoded request bodies
[POS]:    XML layer - wire format for the API
[UPDATE]: When the server's XML schema changes
*/

pub mod modules;
pub mod response;

pub use modules::presentation_modules;
pub use response::*;
