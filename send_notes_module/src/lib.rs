mod send_notes;

pub use send_notes::{
    build_transport, CurlTransport, NativeTransport, NoteRequest, NoteTransport, ShellFlavor,
    TransportError, TransportKind, TransportOptions, API_KEY_HEADER,
};
